//! Crawler coordinator - orchestration of one crawl run
//!
//! A run for a tag:
//! 1. Fetches listing page 0 synchronously to learn the match count
//! 2. Hands page 0's posts to ingestion
//! 3. Submits a listing fetch for every further page, each of which hands its
//!    own posts to ingestion
//! 4. Waits for every spawned task, then drains both pools
//!
//! Only a failure of page 0 aborts the run. Everything below it is logged
//! where it happens and recorded in the run report.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, fetch_listing, listing_url};
use crate::crawler::image_store::ImageStore;
use crate::crawler::ingest::{IngestOutcome, Ingestor, SharedStorage};
use crate::crawler::limiter::Limiter;
use crate::crawler::report::{CrawlReport, FailureKind, RunTally};
use crate::crawler::retry::RetryPolicy;
use crate::model::RemotePost;
use crate::CrawlError;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use url::Url;

/// Main crawler coordinator structure
///
/// Holds what every run shares (HTTP client, storage, settings). Pools,
/// task tracking and counters are created fresh by each `run`.
pub struct Coordinator {
    client: Client,
    endpoint: Url,
    crawler: CrawlerConfig,
    ingestor: Arc<Ingestor>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Database shared with every ingest task
    pub fn new(config: &Config, storage: SharedStorage) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent)?;
        let endpoint = Url::parse(&config.crawler.listing_endpoint)?;

        let images = ImageStore::new(
            client.clone(),
            &config.storage.image_path,
            RetryPolicy::from_config(&config.retry),
        )
        .with_timeout(config.crawler.download_timeout());
        let ingestor = Arc::new(Ingestor::new(storage, images, config.crawler.site.clone()));

        Ok(Self {
            client,
            endpoint,
            crawler: config.crawler.clone(),
            ingestor,
        })
    }

    /// Runs one crawl for `tag`
    ///
    /// Returns once every listing and ingest task of the run has finished.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run completed, possibly with dropped items
    /// * `Err(CrawlError)` - Page 0 could not be fetched; nothing was ingested
    pub async fn run(&self, tag: &str) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        let run = Arc::new(Run {
            tag: tag.to_string(),
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            timeout: self.crawler.request_timeout(),
            limiter: Limiter::from_config(&self.crawler),
            tracker: TaskTracker::new(),
            tally: RunTally::default(),
            ingestor: self.ingestor.clone(),
        });

        let first_url = listing_url(&self.endpoint, tag, None);
        let first = fetch_listing(&self.client, &first_url, run.timeout).await?;
        run.tally.page_fetched();

        let total_count = first.count;
        let pages = first.page_count(self.crawler.page_size);
        tracing::info!(
            "Crawling '{}': {} matches across {} pages",
            tag,
            total_count,
            pages
        );

        run.submit_first_page(first.posts).await;
        for page in 1..pages {
            run.submit_page(page).await;
        }

        run.tracker.close();
        run.tracker.wait().await;
        run.limiter.drain().await;

        let report = run.tally.report(tag, started_at, total_count, pages);
        report.log_summary();
        Ok(report)
    }
}

/// State of one crawl run, shared by all of its tasks
struct Run {
    tag: String,
    client: Client,
    endpoint: Url,
    timeout: Duration,
    limiter: Limiter,
    tracker: TaskTracker,
    tally: RunTally,
    ingestor: Arc<Ingestor>,
}

impl Run {
    /// Dispatches page 0's posts from a listing slot, like any other page
    async fn submit_first_page(self: &Arc<Self>, posts: Vec<RemotePost>) {
        let Some(permit) = self.limiter.listing.acquire().await else {
            tracing::warn!("Listing pool closed, dropping first page of '{}'", self.tag);
            return;
        };

        let run = Arc::clone(self);
        self.tracker.spawn(async move {
            let _permit = permit;
            run.submit_posts(posts).await;
        });
    }

    async fn submit_page(self: &Arc<Self>, page: u64) {
        let Some(permit) = self.limiter.listing.acquire().await else {
            tracing::warn!("Listing pool closed, dropping page {} of '{}'", page, self.tag);
            return;
        };

        let run = Arc::clone(self);
        self.tracker.spawn(async move {
            let _permit = permit;
            run.crawl_page(page).await;
        });
    }

    async fn crawl_page(self: &Arc<Self>, page: u64) {
        let url = listing_url(&self.endpoint, &self.tag, Some(page));
        match fetch_listing(&self.client, &url, self.timeout).await {
            Ok(listing) => {
                self.tally.page_fetched();
                self.submit_posts(listing.posts).await;
            }
            Err(e) => self
                .tally
                .failed(FailureKind::Listing, url.as_str(), e.to_string()),
        }
    }

    /// Spawns one ingest task per post
    ///
    /// Waits for an ingest slot before each spawn, so a listing task stays
    /// admitted until all of its posts are admitted.
    async fn submit_posts(self: &Arc<Self>, posts: Vec<RemotePost>) {
        for post in posts {
            let Some(permit) = self.limiter.ingest.acquire().await else {
                tracing::warn!("Ingest pool closed, dropping remaining posts");
                return;
            };

            let run = Arc::clone(self);
            self.tracker.spawn(async move {
                let _permit = permit;
                run.ingest(post).await;
            });
        }
    }

    async fn ingest(&self, post: RemotePost) {
        match self.ingestor.ingest(&post).await {
            Ok(IngestOutcome::Ingested { post_created, .. }) => {
                self.tally.post_ingested(post_created)
            }
            Ok(IngestOutcome::Skipped) => self.tally.post_skipped(),
            Err(e) => {
                tracing::error!("Dropping post {} ({}): {}", post.id, post.file_url, e);
                let kind = match e {
                    CrawlError::Storage(_) | CrawlError::Json(_) => FailureKind::Persist,
                    _ => FailureKind::Download,
                };
                self.tally.failed(kind, &post.file_url, e.to_string());
            }
        }
    }
}
