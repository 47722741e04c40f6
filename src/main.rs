//! Beldre main entry point
//!
//! This is the command-line interface for the image-board crawler.

use anyhow::{bail, Context};
use beldre::config::{load_config_with_hash, Config};
use beldre::crawler::Coordinator;
use beldre::output::{load_statistics, print_statistics};
use beldre::storage::open_storage;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Beldre: an image-board crawler
///
/// Pages through the remote listing of every given tag, stores each image
/// under its content hash and records posts and tags in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "beldre")]
#[command(version)]
#[command(about = "An image-board crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Tags to crawl, one run per tag in the given order
    #[arg(value_name = "TAG")]
    tags: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.tags);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &cli.tags).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("beldre=info,warn"),
            1 => EnvFilter::new("beldre=debug,info"),
            2 => EnvFilter::new("beldre=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective settings and planned tags
fn handle_dry_run(config: &Config, tags: &[String]) {
    println!("=== Beldre Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Site: {}", config.crawler.site);
    println!("  Listing endpoint: {}", config.crawler.listing_endpoint);
    println!("  Listing timeout: {}s", config.crawler.request_timeout);
    println!("  Listing concurrency: {}", config.crawler.listing_concurrency);
    println!("  Ingest concurrency: {}", config.crawler.ingest_concurrency);
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Download timeout: {}s", config.crawler.download_timeout);

    println!("\nDownload Retry:");
    println!("  Initial interval: {}ms", config.retry.initial_interval);
    println!("  Multiplier: {}", config.retry.multiplier);
    println!("  Max interval: {}ms", config.retry.max_interval);
    println!("  Give up after: {}s", config.retry.max_elapsed);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Images: {}", config.storage.image_path);

    println!("\nTags ({}):", tags.len());
    for tag in tags {
        println!("  - {}", tag);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, tags: &[String]) -> anyhow::Result<()> {
    if tags.is_empty() {
        bail!("no tags given, nothing to crawl");
    }

    std::fs::create_dir_all(&config.storage.image_path).with_context(|| {
        format!(
            "failed to create image directory {}",
            config.storage.image_path
        )
    })?;

    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("failed to open database")?;
    let coordinator = Coordinator::new(config, Arc::new(Mutex::new(storage)))?;

    let mut aborted = 0;
    for tag in tags {
        tracing::info!("Starting crawl of '{}'", tag);
        if let Err(e) = coordinator.run(tag).await {
            tracing::error!("Crawl of '{}' aborted: {}", tag, e);
            aborted += 1;
        }
    }

    if aborted == tags.len() {
        bail!("every crawl aborted before its first listing page");
    }

    Ok(())
}
