//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for both the listing API and the
//! image host, and run full crawls against a temporary database and
//! image directory.

mod crawl_tests;
mod ingest_tests;
