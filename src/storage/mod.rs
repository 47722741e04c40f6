//! Storage module for persisting crawl results
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Transactional ingestion of posts, tags and raw payloads
//! - Duplicate detection by file url and content hash
//! - Statistics queries

mod schema;
mod sqlite;
mod traits;

pub use schema::CRAWLER_ACCOUNT;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a post in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub uploader: i64,
    pub hash: String,
    pub crawl_info: Option<i64>,
    pub source: Option<String>,
}

/// Result of writing one remote post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The crawl payload was recorded
    Stored {
        crawl_info_id: i64,
        /// False when a post with the same hash already existed
        post_created: bool,
        /// Tag links added by this write
        tags_linked: usize,
    },

    /// Another ingest recorded the same url first; nothing was written
    Duplicate,
}
