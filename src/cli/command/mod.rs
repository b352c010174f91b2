pub mod extract;
pub mod fetch;

use std::path::PathBuf;

pub use extract::{extract, Variant};
pub use fetch::fetch;

use crate::config::Settings;

/// The zip archive for a run, named after the program and variant.
pub fn make_archive_file_name(settings: &Settings, variant: &str) -> PathBuf {
    let file_name = format!("{}-{}.zip", env!("CARGO_PKG_NAME"), variant);

    settings.archive_dir.join(file_name)
}

// -- Tests -------------------------------------------------------------------
