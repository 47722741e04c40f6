//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawl database.

/// Account recorded as uploader and tag assigner for crawled posts
pub const CRAWLER_ACCOUNT: &str = "crawler";

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Accounts; the crawler owns everything it ingests
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

INSERT INTO user (name) VALUES ('crawler') ON CONFLICT(name) DO NOTHING;

-- Raw listing payload of every downloaded post, one row per file url
CREATE TABLE IF NOT EXISTS post_crawl_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    data TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

-- Posts are identified by the content hash of their image
CREATE TABLE IF NOT EXISTS post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uploader INTEGER NOT NULL REFERENCES user(id),
    hash TEXT NOT NULL UNIQUE,
    crawl_info INTEGER REFERENCES post_crawl_info(id),
    source TEXT
);

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS post_tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post INTEGER NOT NULL REFERENCES post(id),
    tag INTEGER NOT NULL REFERENCES tag(id),
    assigned_by INTEGER NOT NULL REFERENCES user(id),
    UNIQUE(post, tag)
);

CREATE INDEX IF NOT EXISTS idx_post_tag_tag ON post_tag(tag);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database: every statement is
/// `IF NOT EXISTS` or conflict-tolerant.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
