//! Beldre: an image-board crawler
//!
//! This crate pages through a remote post listing for a tag, downloads every
//! referenced image into content-addressed storage, and records the post,
//! its tags and the raw listing payload in a SQLite database.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} responded with non 200 status code {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed listing from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Storage directory error at {path}: {source}")]
    PermanentIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true for failures worth another attempt (connection errors, bad status)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Status { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_tag, CrawlReport};
pub use model::{ListingPage, RemotePost, StoredAsset};
