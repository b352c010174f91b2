//! Command line interface.

pub mod command;

use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Extracts climate indicator time series from the Copernicus Climate Data Store
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub settings: Settings,

    /// Log filter, e.g. `info` or `ecde_indicators=debug`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// One CSV per variable with a column for every city (default)
    Merged {},
    /// One CSV per variable and city
    Split {},
    /// One CSV per variable and region, averaged over the region
    Regions {},
    /// Download and unpack the datasets only
    Fetch {},
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
