//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{Storage, StorageResult};

/// Number of tags listed by `print_statistics`
const TOP_TAG_LIMIT: usize = 10;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Distinct images (one post per content hash)
    pub posts: u64,

    /// Crawled listing entries, one per file url
    pub crawl_infos: u64,

    pub tags: u64,

    pub tag_links: u64,

    /// Most used tags with their post counts
    pub top_tags: Vec<(String, u64)>,
}

impl StoreStatistics {
    /// Crawled entries that resolved to an image already stored under another url
    pub fn converged_entries(&self) -> u64 {
        self.crawl_infos.saturating_sub(self.posts)
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        posts: storage.count_posts()?,
        crawl_infos: storage.count_crawl_infos()?,
        tags: storage.count_tags()?,
        tag_links: storage.count_post_tags()?,
        top_tags: storage.get_top_tags(TOP_TAG_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Posts: {}", stats.posts);
    println!("  Crawled entries: {}", stats.crawl_infos);
    println!("  Duplicate content: {}", stats.converged_entries());
    println!("  Tags: {}", stats.tags);
    println!("  Tag links: {}", stats.tag_links);
    println!();

    if !stats.top_tags.is_empty() {
        println!("Top Tags:");
        for (name, count) in &stats.top_tags {
            let percentage = if stats.posts > 0 {
                (*count as f64 / stats.posts as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", name, count, percentage);
        }
    }
}
