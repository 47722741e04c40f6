//! Bounded admission pools for crawl work
//!
//! A run owns two independent pools:
//! - "listing" bounds concurrent listing page fetches
//! - "ingest" bounds concurrent post downloads and writes
//!
//! A slot is taken by whoever submits the work, before the task is spawned,
//! and is released when the task drops its permit. `drain` relies on that:
//! once it holds every slot of a pool, no task admitted to that pool is
//! still running.

use crate::config::CrawlerConfig;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// One counting pool with a fixed capacity
#[derive(Debug, Clone)]
pub struct Pool {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    capacity: u32,
}

impl Pool {
    pub fn new(name: &'static str, capacity: u32) -> Self {
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot
    ///
    /// The slot is released when the returned permit is dropped. Returns
    /// `None` only if the pool was closed, which a run never does.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    /// Blocks until every admitted task has released its slot
    ///
    /// Acquires the full capacity, then releases it. Only meaningful once no
    /// new work for this run can be submitted to the pool.
    pub async fn drain(&self) {
        match self.semaphore.acquire_many(self.capacity).await {
            Ok(all) => drop(all),
            Err(_) => tracing::warn!("{} pool closed before drain", self.name),
        }
    }
}

/// The listing and ingest pools of one crawl run
#[derive(Debug, Clone)]
pub struct Limiter {
    pub listing: Pool,
    pub ingest: Pool,
}

impl Limiter {
    pub fn new(listing_capacity: u32, ingest_capacity: u32) -> Self {
        Self {
            listing: Pool::new("listing", listing_capacity),
            ingest: Pool::new("ingest", ingest_capacity),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.listing_concurrency, config.ingest_concurrency)
    }

    /// Drains the listing pool, then the ingest pool
    ///
    /// Listing tasks submit ingest work, so the ingest pool can only be
    /// considered settled once no listing task is left.
    pub async fn drain(&self) {
        self.listing.drain().await;
        self.ingest.drain().await;
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(10, 15)
    }
}
