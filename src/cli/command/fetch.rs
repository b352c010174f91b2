//! Download the CDS archives and unpack their netCDF files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    archive::{extract_zip, is_nc_file, list_nc_files},
    cds::{CdsClient, DatasetKind},
    cli::create_spinner,
    config::{Settings, DATASET},
    credentials,
};

/// Makes the netCDF files available and returns how many there are.
pub async fn fetch(settings: &Settings) -> Result<usize> {
    let files = load_nc_files(settings).await?;

    Ok(files.len())
}

/// Returns the extracted netCDF files, sorted.
///
/// A non-empty `nc` directory from an earlier run is reused as is, without
/// checking it against the archives.
pub async fn load_nc_files(settings: &Settings) -> Result<Vec<PathBuf>> {
    let nc_dir = settings.nc_dir();

    if settings.refresh && nc_dir.exists() {
        info!(dir = %nc_dir.display(), "Discarding extracted files");
        fs::remove_dir_all(&nc_dir)
            .with_context(|| format!("Failed to remove {}", nc_dir.display()))?;
    }

    if let Some(files) = reusable_nc_files(&nc_dir)? {
        info!(count = files.len(), dir = %nc_dir.display(), "Reusing extracted netCDF files");
        return Ok(files);
    }

    let archives = fetch_datasets(settings).await?;
    let mut files = Vec::new();
    for archive in &archives {
        let bar = create_spinner(format!("Unpacking {}", archive.display()));
        let members = extract_zip(archive, &nc_dir)?;
        bar.finish_with_message(format!("Unpacked {}", archive.display()));

        files.extend(members.into_iter().filter(|path| is_nc_file(path)));
    }
    files.sort();
    files.dedup();

    Ok(files)
}

fn reusable_nc_files(nc_dir: &Path) -> Result<Option<Vec<PathBuf>>> {
    if !nc_dir.is_dir() {
        return Ok(None);
    }

    let files = list_nc_files(nc_dir)?;
    Ok((!files.is_empty()).then_some(files))
}

/// Downloads every dataset archive that is not on disk yet.
///
/// The API key is only resolved when something has to be downloaded.
pub async fn fetch_datasets(settings: &Settings) -> Result<Vec<PathBuf>> {
    let cds_dir = settings.cds_dir();
    let mut archives = Vec::new();
    let mut missing = Vec::new();

    for kind in DatasetKind::ALL {
        let path = kind.archive_path(&cds_dir);
        if path.exists() {
            info!(dataset = %kind, path = %path.display(), "Dataset locally available");
        } else {
            missing.push((kind, path.clone()));
        }
        archives.push(path);
    }

    if missing.is_empty() {
        return Ok(archives);
    }

    let key = credentials::resolve(settings)?;
    let client = CdsClient::new(&settings.api_url, key)?;
    fs::create_dir_all(&cds_dir)
        .with_context(|| format!("Failed to create {}", cds_dir.display()))?;

    for (kind, path) in missing {
        info!(dataset = %kind, "Downloading dataset");
        client
            .retrieve(DATASET, &kind.request(), &path)
            .await
            .with_context(|| format!("Failed to retrieve {} dataset", kind))?;
    }

    Ok(archives)
}

// -- Tests -------------------------------------------------------------------
