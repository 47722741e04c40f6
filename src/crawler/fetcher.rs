//! HTTP fetcher implementation
//!
//! This module handles the listing side of the crawl:
//! - Building the shared HTTP client with a proper user agent string
//! - Building listing URLs for a tag and page index
//! - Fetching and decoding one listing page
//!
//! Listing fetches are never retried. A failed page is dropped and picked up
//! again by a later run.

use crate::config::UserAgentConfig;
use crate::model::ListingPage;
use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// No overall timeout is set on the client. Listing requests and image
/// downloads each set their own per-request timeout.
///
/// # Example
///
/// ```no_run
/// use beldre::config::UserAgentConfig;
/// use beldre::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "beldre".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the listing URL for `tag`
///
/// The first page is requested without a `pid` parameter, later pages with
/// their zero-based index.
pub fn listing_url(endpoint: &Url, tag: &str, page: Option<u64>) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("tags", tag);
        if let Some(page) = page {
            query.append_pair("pid", &page.to_string());
        }
    }
    url
}

/// Fetches and decodes one listing page
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Fully formed listing URL
/// * `timeout` - Timeout for the whole request
///
/// # Returns
///
/// * `Ok(ListingPage)` - The decoded page
/// * `Err(CrawlError::Http | CrawlError::Status)` - Transport failure
/// * `Err(CrawlError::MalformedResponse)` - Body is not a listing document
pub async fn fetch_listing(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<ListingPage, CrawlError> {
    let result = fetch_listing_inner(client, url, timeout).await;
    if let Err(e) = &result {
        tracing::warn!("Listing fetch failed: {}", e);
    }
    result
}

async fn fetch_listing_inner(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<ListingPage, CrawlError> {
    let http_error = |source| CrawlError::Http {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(http_error)?;
    let page: ListingPage =
        quick_xml::de::from_str(&body).map_err(|e| CrawlError::MalformedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    tracing::debug!(
        "Fetched listing {} ({} posts, count {}, offset {})",
        url,
        page.posts.len(),
        page.count,
        page.offset
    );

    Ok(page)
}
