//! Crawler module for listing pagination and post ingestion
//!
//! This module contains the core crawling logic, including:
//! - Listing page fetching and decoding
//! - Bounded listing and ingest pools with a drain barrier
//! - Content-addressed image downloads with retry
//! - Per-post ingestion into storage
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod image_store;
mod ingest;
mod limiter;
mod report;
mod retry;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_listing, listing_url};
pub use image_store::ImageStore;
pub use ingest::{IngestOutcome, Ingestor, SharedStorage};
pub use limiter::{Limiter, Pool};
pub use report::{CrawlReport, FailureKind, TaskFailure};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl for one tag
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client and image store
/// 2. Fetch the first listing page and plan the remaining pages
/// 3. Ingest every listed post under the configured concurrency limits
/// 4. Return once all spawned work has finished
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; dropped items are listed in the report
/// * `Err(CrawlError)` - The first listing page could not be fetched
pub async fn crawl_tag(
    config: &Config,
    storage: SharedStorage,
    tag: &str,
) -> Result<CrawlReport, CrawlError> {
    Coordinator::new(config, storage)?.run(tag).await
}
