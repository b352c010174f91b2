//! Unpacks downloaded zip archives and packs the output directory.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use zip::{write::SimpleFileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Extracts every member of `archive_path` into `working_dir` and returns
/// the paths of the extracted members, sorted.
pub fn extract_zip(archive_path: &Path, working_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", archive_path.display()))?;

    fs::create_dir_all(working_dir)?;
    let mut members: Vec<PathBuf> = archive
        .file_names()
        .map(|name| working_dir.join(name))
        .collect();
    members.sort();

    archive
        .extract(working_dir)
        .with_context(|| format!("Failed to extract {}", archive_path.display()))?;

    Ok(members)
}

/// Lists the netCDF files directly inside `dir`, sorted by name.
pub fn list_nc_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = dir
        .read_dir()?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, io::Error>>()?
        .into_iter()
        .filter(|path| is_nc_file(path))
        .collect();
    files.sort();

    Ok(files)
}

pub fn is_nc_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "nc")
}

/// Writes every regular file in `source_dir` into a flat zip at `target`.
///
/// Entries are sorted and carry a fixed timestamp, so identical inputs give
/// identical archives.
pub fn zip_directory(source_dir: &Path, target: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = source_dir
        .read_dir()
        .with_context(|| format!("Failed to read {}", source_dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, io::Error>>()?
        .into_iter()
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = ZipWriter::new(
        File::create(target).with_context(|| format!("Failed to create {}", target.display()))?,
    );
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        writer.start_file(name, options)?;
        let mut file = File::open(&path)?;
        io::copy(&mut file, &mut writer)?;
    }

    writer.finish()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
