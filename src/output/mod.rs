//! Output module for reporting on the crawl database
//!
//! This module handles:
//! - Loading store-wide statistics (posts, tags, payloads)
//! - Printing them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
