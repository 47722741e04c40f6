//! Run report
//!
//! Spawned tasks never hand their errors back to the coordinator. They log at
//! the point of failure and record the outcome here, so a finished run can
//! still be inspected by tests and summarized in the logs.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Which stage a dropped item failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A listing page could not be fetched or decoded
    Listing,
    /// An image download gave up or hit a storage directory error
    Download,
    /// The post transaction was rolled back
    Persist,
}

/// One dropped page or post
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub kind: FailureKind,
    /// Listing URL or file URL of the dropped item
    pub target: String,
    pub message: String,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub tag: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Match count reported by the first listing page
    pub total_count: u64,
    /// Pages requested, page 0 included
    pub pages_planned: u64,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub posts_ingested: u64,
    /// Ingested posts whose content already had a post row
    pub posts_converged: u64,
    pub posts_skipped: u64,
    pub posts_failed: u64,
    pub failures: Vec<TaskFailure>,
}

impl CrawlReport {
    /// Number of posts that were handed to ingestion
    pub fn posts_attempted(&self) -> u64 {
        self.posts_ingested + self.posts_skipped + self.posts_failed
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &TaskFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Logs the run summary
    pub fn log_summary(&self) {
        let elapsed = self.finished_at - self.started_at;
        tracing::info!(
            "Crawl of '{}' finished in {}s: {}/{} pages, {} ingested ({} converged), {} skipped, {} failed",
            self.tag,
            elapsed.num_seconds(),
            self.pages_fetched,
            self.pages_planned,
            self.posts_ingested,
            self.posts_converged,
            self.posts_skipped,
            self.posts_failed
        );
        if self.pages_failed > 0 {
            tracing::warn!("{} listing pages were dropped", self.pages_failed);
        }
    }
}

/// Counters shared by every task of a run
#[derive(Debug, Default)]
pub(crate) struct RunTally {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    posts_ingested: AtomicU64,
    posts_converged: AtomicU64,
    posts_skipped: AtomicU64,
    posts_failed: AtomicU64,
    failures: Mutex<Vec<TaskFailure>>,
}

impl RunTally {
    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn post_ingested(&self, post_created: bool) {
        self.posts_ingested.fetch_add(1, Ordering::Relaxed);
        if !post_created {
            self.posts_converged.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn post_skipped(&self) {
        self.posts_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self, kind: FailureKind, target: &str, message: String) {
        let counter = match kind {
            FailureKind::Listing => &self.pages_failed,
            FailureKind::Download | FailureKind::Persist => &self.posts_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        // A poisoned list only loses the detail, the counters stay correct
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(TaskFailure {
                kind,
                target: target.to_string(),
                message,
            });
        }
    }

    /// Freezes the counters into a report
    ///
    /// Call once every task of the run has finished.
    pub fn report(
        &self,
        tag: &str,
        started_at: DateTime<Utc>,
        total_count: u64,
        pages_planned: u64,
    ) -> CrawlReport {
        CrawlReport {
            tag: tag.to_string(),
            started_at,
            finished_at: Utc::now(),
            total_count,
            pages_planned,
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            posts_ingested: self.posts_ingested.load(Ordering::Relaxed),
            posts_converged: self.posts_converged.load(Ordering::Relaxed),
            posts_skipped: self.posts_skipped.load(Ordering::Relaxed),
            posts_failed: self.posts_failed.load(Ordering::Relaxed),
            failures: self
                .failures
                .lock()
                .map(|failures| failures.clone())
                .unwrap_or_default(),
        }
    }
}
