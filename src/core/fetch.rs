//! Fetcher - downloads GeoNames files to local storage.
//!
//! Bodies are streamed to disk chunk by chunk; the multi-gigabyte dumps never sit in
//! memory. An existing file at the destination is overwritten, never resumed, and a
//! partially written file is removed when the download fails.

use crate::{
    config::DownloadConfig,
    errors::{Error, Result},
};
use reqwest::Url;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Something that can place a remote file into a local directory.
pub trait Fetcher {
    /// Downloads `url` into `destination_dir` and returns the local file path.
    fn download(
        &self,
        url: &str,
        destination_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Derives the local file name from the last path segment of `url`.
///
/// # Errors
/// Returns `Error::Config` for unparseable URLs or URLs without a file name.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL {url}: {e}")))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::config(format!("URL {url} does not name a file")))
}

/// Why a single attempt failed, and whether trying again could help.
#[derive(Debug)]
struct AttemptFailure {
    message: String,
    retryable: bool,
}

impl AttemptFailure {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        let retryable = err.is_connect()
            || err.is_timeout()
            || err.is_body()
            || err.status().is_some_and(|s| s.is_server_error());
        Self {
            message: err.to_string(),
            retryable,
        }
    }

    fn from_io(action: &str, path: &Path, err: &std::io::Error) -> Self {
        Self {
            message: format!("Failed to {action} {}: {err}", path.display()),
            retryable: false,
        }
    }
}

/// HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the download configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            attempts: config.attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    async fn attempt(&self, url: &str, destination: &Path) -> std::result::Result<u64, AttemptFailure> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptFailure::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure {
                message: format!("Unexpected HTTP status {status}"),
                retryable: status.is_server_error(),
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| AttemptFailure::from_io("create", destination, &e))?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AttemptFailure::from_reqwest(&e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| AttemptFailure::from_io("write", destination, &e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| AttemptFailure::from_io("flush", destination, &e))?;
        Ok(written)
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self, destination_dir))]
    async fn download(&self, url: &str, destination_dir: &Path) -> Result<PathBuf> {
        let destination = destination_dir.join(file_name_from_url(url)?);
        let local_failure = |action: &str, path: &Path, e: std::io::Error| Error::Network {
            url: url.to_owned(),
            message: AttemptFailure::from_io(action, path, &e).message,
        };
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| local_failure("create", destination_dir, e))?;

        let mut attempt = 1;
        loop {
            debug!("Downloading {} (attempt {}/{})", url, attempt, self.attempts);
            match self.attempt(url, &destination).await {
                Ok(bytes) => {
                    let exists = tokio::fs::try_exists(&destination)
                        .await
                        .map_err(|e| local_failure("check", &destination, e))?;
                    if !exists {
                        return Err(Error::Network {
                            url: url.to_owned(),
                            message: format!("{} missing after download", destination.display()),
                        });
                    }
                    info!("Downloaded {} ({} bytes) to {}", url, bytes, destination.display());
                    return Ok(destination);
                }
                Err(failure) if failure.retryable && attempt < self.attempts => {
                    warn!(
                        "Download of {} failed ({}), retrying in {:?}",
                        url, failure.message, self.retry_delay
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(failure) => {
                    if let Err(e) = tokio::fs::remove_file(&destination).await
                        && e.kind() != std::io::ErrorKind::NotFound
                    {
                        warn!("Unable to remove partial download {}: {}", destination.display(), e);
                    }
                    return Err(Error::Network {
                        url: url.to_owned(),
                        message: failure.message,
                    });
                }
            }
        }
    }
}
