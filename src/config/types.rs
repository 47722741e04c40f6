use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing endpoint; `tags` and `pid` query parameters are appended to it
    #[serde(rename = "listing-endpoint")]
    pub listing_endpoint: String,

    /// Site name recorded with every crawled post
    pub site: String,

    /// Listing request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum number of listing pages fetched at once
    #[serde(rename = "listing-concurrency", default = "default_listing_concurrency")]
    pub listing_concurrency: u32,

    /// Maximum number of posts ingested at once
    #[serde(rename = "ingest-concurrency", default = "default_ingest_concurrency")]
    pub ingest_concurrency: u32,

    /// Number of posts the remote returns per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u64,

    /// Timeout for a single image download attempt, body included (seconds)
    #[serde(rename = "download-timeout", default = "default_download_timeout")]
    pub download_timeout: u64,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}

fn default_request_timeout() -> u64 {
    20
}

fn default_download_timeout() -> u64 {
    60
}

fn default_listing_concurrency() -> u32 {
    10
}

fn default_ingest_concurrency() -> u32 {
    15
}

fn default_page_size() -> u64 {
    100
}

/// Image download retry settings
///
/// Every key is optional; missing keys keep their default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// First retry delay (milliseconds)
    #[serde(rename = "initial-interval")]
    pub initial_interval: u64,

    /// Factor applied to the delay after every failed attempt
    pub multiplier: f64,

    /// Upper bound for a single delay (milliseconds)
    #[serde(rename = "max-interval")]
    pub max_interval: u64,

    /// Give up once this much time has passed since the first attempt (seconds)
    #[serde(rename = "max-elapsed")]
    pub max_elapsed: u64,

    /// Jitter applied to every delay, 0.0 disables it
    #[serde(rename = "randomization-factor")]
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: 500,
            multiplier: 1.5,
            max_interval: 60_000,
            max_elapsed: 900,
            randomization_factor: 0.5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Where crawl results are written
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory holding downloaded images and their staging files
    #[serde(rename = "image-path")]
    pub image_path: String,
}
