mod archive;
mod attributes;
mod cdo;
mod cds;
mod cli;
mod config;
mod credentials;
mod download;
mod locations;
mod output;
mod series;
#[cfg(test)]
mod test_server;

use anyhow::Result;
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let Cli {
        command: subcommand,
        settings,
        log_level,
    } = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_new(&log_level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let variant = match subcommand.unwrap_or(Commands::Merged {}) {
        Commands::Merged {} => command::Variant::merged(),
        Commands::Split {} => command::Variant::split(),
        Commands::Regions {} => command::Variant::regions(),
        Commands::Fetch {} => {
            let count = command::fetch(&settings).await?;
            println!(
                "{} netCDF files available in `{}`",
                count,
                settings.nc_dir().display()
            );
            return Ok(());
        }
    };

    info!(variant = variant.name, data_dir = %settings.data_dir.display(), "Starting extraction");
    let archive = command::extract(&settings, &variant).await?;
    println!("Archive saved to `{}`", archive.display());

    Ok(())
}
