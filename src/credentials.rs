//! Resolves the CDS API key.

use std::{fmt, process::Command};

use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to run secret store command `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret store command `{command} {path}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Secret store entry `{0}` is empty")]
    Empty(String),
}

/// An API key. Its value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Returns the configured key, or looks it up in the secret store.
pub fn resolve(settings: &Settings) -> Result<ApiKey, CredentialError> {
    if let Some(key) = settings.api_key.as_deref().map(str::trim) {
        if !key.is_empty() {
            debug!("Using API key from settings");
            return Ok(ApiKey::new(key));
        }
    }

    from_secret_store(&settings.secret_command, &settings.secret_path)
}

/// Runs `<command> <path>` and takes the first line of its output.
pub fn from_secret_store(command: &str, path: &str) -> Result<ApiKey, CredentialError> {
    debug!(command, path, "Querying secret store");

    let output = Command::new(command)
        .arg(path)
        .output()
        .map_err(|source| CredentialError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CredentialError::Failed {
            command: command.to_string(),
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().next().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(ApiKey::new(key)),
        _ => Err(CredentialError::Empty(path.to_string())),
    }
}

// -- Tests -------------------------------------------------------------------
