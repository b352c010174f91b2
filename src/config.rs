//! Run settings shared by every command.

use std::path::PathBuf;

use clap::Args;

/// CDS dataset all requests are made against.
pub const DATASET: &str = "sis-ecde-climate-indicators";

/// Coordinate reference system of every location table.
pub const CRS: &str = "EPSG:4326";

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Base directory holding the `cds`, `nc` and `csv` folders
    #[arg(
        long,
        global = true,
        env = "ECDE_DATA_DIR",
        default_value = "data/sis-ecde-climate-indicators"
    )]
    pub data_dir: PathBuf,

    /// Directory the final zip archive is written to
    #[arg(long, global = true, env = "ECDE_ARCHIVE_DIR", default_value = ".")]
    pub archive_dir: PathBuf,

    /// Base URL of the Climate Data Store API
    #[arg(
        long,
        global = true,
        env = "CDSAPI_URL",
        default_value = "https://cds.climate.copernicus.eu/api"
    )]
    pub api_url: String,

    /// API key; when absent the secret store is queried
    #[arg(long, global = true, env = "CDSAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Secret store executable, called as `<command> <secret-path>`
    #[arg(long, global = true, env = "ECDE_SECRET_COMMAND", default_value = "pass")]
    pub secret_command: String,

    /// Entry in the secret store holding the API key
    #[arg(
        long,
        global = true,
        env = "ECDE_SECRET_PATH",
        default_value = "work/stadtkn/cds-beta.climate.copernicus.eu/api-key"
    )]
    pub secret_path: String,

    /// Path of the `cdo` executable
    #[arg(long, global = true, env = "CDO", default_value = "cdo")]
    pub cdo: PathBuf,

    /// Discard previously extracted netCDF files before running
    #[arg(long, global = true)]
    pub refresh: bool,
}

impl Settings {
    /// Settings with every default applied, rooted at `data_dir`.
    #[cfg(test)]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            archive_dir: PathBuf::from("."),
            api_url: "https://cds.climate.copernicus.eu/api".to_string(),
            api_key: None,
            secret_command: "pass".to_string(),
            secret_path: "work/stadtkn/cds-beta.climate.copernicus.eu/api-key".to_string(),
            cdo: PathBuf::from("cdo"),
            refresh: false,
        }
    }

    /// Downloaded CDS archives.
    pub fn cds_dir(&self) -> PathBuf {
        self.data_dir.join("cds")
    }

    /// Extracted netCDF files.
    pub fn nc_dir(&self) -> PathBuf {
        self.data_dir.join("nc")
    }

    /// CSV and JSON outputs.
    pub fn csv_dir(&self) -> PathBuf {
        self.data_dir.join("csv")
    }
}

// -- Tests -------------------------------------------------------------------
