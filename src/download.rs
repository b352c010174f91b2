//! Streams a remote file to disk.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::RequestBuilder;

/// Sends `request` and writes the response body to `file_path`.
///
/// The body lands in `<file_path>.partial` first and is renamed once
/// complete, so an interrupted transfer never leaves a file at
/// `file_path`.
pub async fn download_with_progress(
    request: RequestBuilder,
    file_path: &Path,
    progress_bar: &ProgressBar,
) -> Result<()> {
    let response = request.send().await.context("Failed to download file")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: {}",
            response.url(),
            response.status()
        ));
    }

    // Switch the spinner to a byte bar once the size is known
    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
            )?
            .progress_chars("=> "),
        );
    }

    let partial_path = partial_path(file_path);
    let mut file = File::create(&partial_path)
        .with_context(|| format!("Failed to create {}", partial_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading chunk")?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }
    file.flush()?;
    drop(file);

    fs::rename(&partial_path, file_path)
        .with_context(|| format!("Failed to move download to {}", file_path.display()))?;

    Ok(())
}

fn partial_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

// -- Tests -------------------------------------------------------------------
