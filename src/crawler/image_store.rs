//! Content-addressed image storage
//!
//! A download streams the response body into a staging file inside the
//! storage directory while hashing it, then renames the staging file to
//! `<sha256 hex>.<extension>`. Staging and final files share a directory so
//! the rename never crosses a filesystem.
//!
//! | Failure | Action |
//! |---------|--------|
//! | Connection / body read error | Retry with backoff |
//! | Attempt exceeds its timeout | Retry with backoff |
//! | Status other than 200 | Retry with backoff |
//! | Staging file create / write | Abort, no retry |
//! | Rename into place | Abort, no retry |

use crate::crawler::retry::RetryPolicy;
use crate::model::{extension_from_url, StoredAsset};
use crate::CrawlError;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Per-attempt download timeout used unless `with_timeout` overrides it
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

type AttemptResult<T> = Result<T, backoff::Error<CrawlError>>;

/// Downloads images into a storage directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    client: Client,
    dir: PathBuf,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ImageStore {
    pub fn new(client: Client, dir: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            client,
            dir: dir.into(),
            retry,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Bounds every attempt, response body included
    ///
    /// A stalled response turns into a transient error, so the retry
    /// policy's elapsed limit still applies to it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Downloads `url` and commits it under its content hash
    ///
    /// Transient failures are retried on a backoff sequence private to this
    /// call. The returned error is the last one seen.
    pub async fn store(&self, url: &str) -> Result<StoredAsset, CrawlError> {
        let extension = extension_from_url(url);

        backoff::future::retry_notify(
            self.retry.backoff(),
            || self.attempt(url, extension),
            |err: CrawlError, delay| {
                tracing::warn!("Download of {} failed ({}), retrying in {:?}", url, err, delay);
            },
        )
        .await
    }

    async fn attempt(&self, url: &str, extension: &str) -> AttemptResult<StoredAsset> {
        let transient = |source| {
            backoff::Error::transient(CrawlError::Http {
                url: url.to_string(),
                source,
            })
        };

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transient)?;

        if response.status() != StatusCode::OK {
            return Err(backoff::Error::transient(CrawlError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            }));
        }

        let staging = tempfile::Builder::new()
            .prefix("tmp-")
            .tempfile_in(&self.dir)
            .map_err(|source| self.permanent(&self.dir, source))?;

        // `staging_path` removes the file when dropped, so every early return
        // below cleans up after itself
        let (file, staging_path) = staging.into_parts();
        let mut file = tokio::fs::File::from_std(file);
        let mut hasher = Sha256::new();

        while let Some(chunk) = response.chunk().await.map_err(transient)? {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|source| self.permanent(&staging_path, source))?;
        }
        file.flush()
            .await
            .map_err(|source| self.permanent(&staging_path, source))?;
        drop(file);

        let asset = StoredAsset::new(&self.dir, hex::encode(hasher.finalize()), extension);
        staging_path
            .persist(&asset.path)
            .map_err(|e| self.permanent(&asset.path, e.error))?;

        tracing::debug!("Stored {} as {}", url, asset.path.display());
        Ok(asset)
    }

    fn permanent(&self, path: &Path, source: std::io::Error) -> backoff::Error<CrawlError> {
        backoff::Error::permanent(CrawlError::PermanentIo {
            path: path.display().to_string(),
            source,
        })
    }
}
