//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use beldre::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("beldre.toml")).unwrap();
//! println!("Images are stored in: {}", config.storage.image_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, RetryConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
