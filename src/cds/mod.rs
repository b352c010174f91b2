//! Client for the Climate Data Store processing API.
//!
//! A retrieval submits a job, polls it until the service has produced
//! the result, then downloads the result asset.

pub mod request;

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::{cli::create_spinner, credentials::ApiKey, download::download_with_progress};

pub use request::{DatasetKind, DatasetRequest};

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const INITIAL_POLL_DELAY: Duration = Duration::from_secs(1);
const MAX_POLL_DELAY: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum CdsError {
    #[error("CDS request to {url} failed with status {status}: {body}")]
    Http {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("CDS job {job_id} ended as {state:?}: {reason}")]
    JobFailed {
        job_id: String,
        state: JobState,
        reason: String,
    },

    #[error("CDS job {0} has no downloadable asset")]
    MissingAsset(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Accepted,
    Running,
    Successful,
    Failed,
    Rejected,
    Dismissed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        !matches!(
            self,
            JobState::Accepted | JobState::Running | JobState::Unknown
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobState,
}

#[derive(Debug, Deserialize)]
struct JobResults {
    asset: Option<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size")]
    size: Option<u64>,
}

/// Error document returned for failed jobs.
#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    title: Option<String>,
    detail: Option<String>,
}

impl ErrorDocument {
    fn reason(&self) -> String {
        match (&self.title, &self.detail) {
            (Some(title), Some(detail)) => format!("{}: {}", title, detail),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => "no reason given".to_string(),
        }
    }
}

pub struct CdsClient {
    http: Client,
    base_url: String,
    key: ApiKey,
}

impl CdsClient {
    pub fn new(base_url: &str, key: ApiKey) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
        })
    }

    /// Runs `request` against `dataset` and blocks until the result is
    /// written to `target`.
    pub async fn retrieve(
        &self,
        dataset: &str,
        request: &DatasetRequest,
        target: &Path,
    ) -> Result<()> {
        let job = self.submit(dataset, request).await?;
        info!(job_id = %job.job_id, dataset, "Request submitted");

        self.wait(&job.job_id).await?;
        let asset = self.results(&job.job_id).await?;
        debug!(href = %asset.href, size = ?asset.size, "Result available");

        // Assets may live on a separate object store that must not see the key
        let mut download = self.http.get(&asset.href);
        if self.is_api_url(&asset.href) {
            download = download.header(TOKEN_HEADER, self.key.expose());
        }

        let bar = create_spinner(format!("Downloading {}", target.display()));
        download_with_progress(download, target, &bar).await?;
        bar.finish_with_message(format!("Downloaded {}", target.display()));

        Ok(())
    }

    async fn submit(&self, dataset: &str, request: &DatasetRequest) -> Result<JobStatus> {
        let url = format!(
            "{}/retrieve/v1/processes/{}/execution",
            self.base_url, dataset
        );
        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, self.key.expose())
            .json(&json!({ "inputs": request }))
            .send()
            .await
            .with_context(|| format!("Failed to submit request to {}", url))?;

        Ok(check(url, response).await?.json().await?)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let url = self.job_url(job_id);
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, self.key.expose())
            .send()
            .await
            .with_context(|| format!("Failed to poll {}", url))?;

        Ok(check(url, response).await?.json().await?)
    }

    async fn wait(&self, job_id: &str) -> Result<()> {
        let bar = create_spinner(format!("Waiting for job {}", job_id));
        let mut delay = INITIAL_POLL_DELAY;

        loop {
            let job = self.status(job_id).await?;
            bar.set_message(format!("Job {} is {:?}", job_id, job.status));

            match job.status {
                JobState::Successful => break,
                state if state.is_finished() => {
                    bar.abandon_with_message(format!("Job {} ended as {:?}", job_id, state));
                    let reason = self.error_reason(job_id).await;
                    return Err(CdsError::JobFailed {
                        job_id: job_id.to_string(),
                        state,
                        reason,
                    }
                    .into());
                }
                _ => {}
            }

            tokio::time::sleep(delay).await;
            delay = next_delay(delay);
        }

        bar.finish_with_message(format!("Job {} completed", job_id));
        Ok(())
    }

    async fn results(&self, job_id: &str) -> Result<AssetValue> {
        let url = format!("{}/results", self.job_url(job_id));
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, self.key.expose())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let results: JobResults = check(url, response).await?.json().await?;
        results
            .asset
            .map(|asset| asset.value)
            .ok_or_else(|| CdsError::MissingAsset(job_id.to_string()).into())
    }

    // The results endpoint carries the error document of a failed job.
    async fn error_reason(&self, job_id: &str) -> String {
        let url = format!("{}/results", self.job_url(job_id));
        let document = match self
            .http
            .get(&url)
            .header(TOKEN_HEADER, self.key.expose())
            .send()
            .await
        {
            Ok(response) => response.json::<ErrorDocument>().await.unwrap_or_default(),
            Err(_) => ErrorDocument::default(),
        };

        document.reason()
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/retrieve/v1/jobs/{}", self.base_url, job_id)
    }

    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.base_url)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

async fn check(url: String, response: reqwest::Response) -> Result<reqwest::Response, CdsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CdsError::Http { url, status, body })
}

fn next_delay(delay: Duration) -> Duration {
    delay.mul_f64(1.5).min(MAX_POLL_DELAY)
}

// -- Tests -------------------------------------------------------------------
