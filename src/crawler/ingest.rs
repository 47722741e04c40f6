//! Ingestion of a single remote post
//!
//! 1. Skip the post if its file url was already recorded
//! 2. Download the image into content-addressed storage
//! 3. Write payload, post, tags and links in one transaction

use crate::crawler::image_store::ImageStore;
use crate::model::RemotePost;
use crate::storage::{PersistOutcome, SqliteStorage, Storage, StorageError, StorageResult};
use crate::CrawlError;
use std::sync::{Arc, Mutex, MutexGuard};

/// Database handle shared by every task of a run
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// What happened to one remote post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Image stored and rows written
    Ingested {
        hash: String,
        /// False when another url with identical content got there first
        post_created: bool,
    },

    /// The file url was already recorded; nothing was downloaded or written
    Skipped,
}

pub struct Ingestor {
    storage: SharedStorage,
    images: ImageStore,
    site: String,
}

impl Ingestor {
    pub fn new(storage: SharedStorage, images: ImageStore, site: impl Into<String>) -> Self {
        Self {
            storage,
            images,
            site: site.into(),
        }
    }

    /// Ingests one remote post
    ///
    /// # Returns
    ///
    /// * `Ok(IngestOutcome)` - Post stored or skipped as a duplicate
    /// * `Err(CrawlError)` - Download failed or the transaction was rolled back
    pub async fn ingest(&self, post: &RemotePost) -> Result<IngestOutcome, CrawlError> {
        let url = post.file_url.clone();
        let seen = self
            .with_storage(move |storage| storage.has_crawl_info(&url))
            .await?;
        if seen {
            tracing::debug!("Skipping already crawled {}", post.file_url);
            return Ok(IngestOutcome::Skipped);
        }

        let asset = self.images.store(&post.file_url).await?;

        let site = self.site.clone();
        let record = post.clone();
        let hash = asset.hash.clone();
        let outcome = self
            .with_storage(move |storage| storage.persist_post(&site, &record, &hash))
            .await?;

        match outcome {
            PersistOutcome::Stored {
                post_created,
                tags_linked,
                ..
            } => {
                tracing::debug!(
                    "Ingested post {} ({}, {} tags linked)",
                    post.id,
                    asset.hash,
                    tags_linked
                );
                Ok(IngestOutcome::Ingested {
                    hash: asset.hash,
                    post_created,
                })
            }
            PersistOutcome::Duplicate => {
                tracing::debug!("{} was recorded concurrently, skipping", post.file_url);
                Ok(IngestOutcome::Skipped)
            }
        }
    }

    /// Runs `f` against the locked storage on the blocking pool
    ///
    /// The lock may be held for a whole transaction by another task, so it is
    /// never taken on a runtime worker.
    async fn with_storage<T, F>(&self, f: F) -> Result<T, CrawlError>
    where
        F: FnOnce(&mut SqliteStorage) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        let result = tokio::task::spawn_blocking(move || f(&mut *lock(&storage)?))
            .await
            .map_err(|e| StorageError::Database(format!("storage task failed: {}", e)))??;
        Ok(result)
    }
}

fn lock(storage: &SharedStorage) -> Result<MutexGuard<'_, SqliteStorage>, StorageError> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}
