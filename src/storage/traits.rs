//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::RemotePost;
use crate::storage::{PersistOutcome, PostRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// All writes for a single post go through `persist_post`, which must be
/// atomic. Every insert it performs tolerates an existing row.
pub trait Storage {
    // ===== Ingestion =====

    /// Returns true if a post with this file url has already been recorded
    ///
    /// This is only a shortcut to skip the download; uniqueness constraints
    /// inside `persist_post` are what keep the data consistent.
    fn has_crawl_info(&self, url: &str) -> StorageResult<bool>;

    /// Writes the crawl payload, post, tags and tag links of one remote post
    ///
    /// # Arguments
    ///
    /// * `site` - Site name recorded with the payload
    /// * `post` - The remote post, stored as JSON
    /// * `hash` - Content hash of the post's downloaded image
    ///
    /// # Returns
    ///
    /// `PersistOutcome::Duplicate` when another ingest recorded this url first.
    /// Nothing is written in that case, nor when an error is returned.
    fn persist_post(
        &mut self,
        site: &str,
        post: &RemotePost,
        hash: &str,
    ) -> StorageResult<PersistOutcome>;

    // ===== Queries =====

    /// Gets a post by its content hash
    fn get_post_by_hash(&self, hash: &str) -> StorageResult<Option<PostRecord>>;

    /// Gets the tag names linked to a post, sorted by name
    fn get_post_tags(&self, post_id: i64) -> StorageResult<Vec<String>>;

    // ===== Statistics =====

    fn count_posts(&self) -> StorageResult<u64>;

    fn count_tags(&self) -> StorageResult<u64>;

    fn count_post_tags(&self) -> StorageResult<u64>;

    fn count_crawl_infos(&self) -> StorageResult<u64>;

    /// Gets the most used tags with their post counts, most used first
    fn get_top_tags(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}
