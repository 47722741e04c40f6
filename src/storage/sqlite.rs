//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::RemotePost;
use crate::storage::schema::{initialize_schema, CRAWLER_ACCOUNT};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PersistOutcome, PostRecord};
use chrono::Utc;
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// True for a UNIQUE constraint failure, as raised by a concurrent insert of the same url
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl Storage for SqliteStorage {
    // ===== Ingestion =====

    fn has_crawl_info(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM post_crawl_info WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn persist_post(
        &mut self,
        site: &str,
        post: &RemotePost,
        hash: &str,
    ) -> StorageResult<PersistOutcome> {
        let data =
            serde_json::to_string(post).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // Dropping `tx` without commit rolls everything back
        let tx = self.conn.transaction()?;

        match tx.execute(
            "INSERT INTO post_crawl_info (site, url, data, crawled_at) VALUES (?1, ?2, ?3, ?4)",
            params![site, post.file_url, data, now],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(PersistOutcome::Duplicate),
            Err(e) => return Err(e.into()),
        }
        let crawl_info_id = tx.last_insert_rowid();

        let post_created = tx.execute(
            "INSERT INTO post (uploader, hash, crawl_info, source)
             VALUES ((SELECT id FROM user WHERE name = ?1), ?2, ?3, ?4)
             ON CONFLICT(hash) DO NOTHING",
            params![CRAWLER_ACCOUNT, hash, crawl_info_id, post.normalized_source()],
        )? == 1;

        let mut tags_linked = 0;
        {
            let mut insert_tag = tx.prepare_cached(
                "INSERT INTO tag (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            )?;
            let mut link_tag = tx.prepare_cached(
                "INSERT INTO post_tag (post, tag, assigned_by)
                 VALUES (
                    (SELECT id FROM post WHERE hash = ?1),
                    (SELECT id FROM tag WHERE name = ?2),
                    (SELECT id FROM user WHERE name = ?3)
                 )
                 ON CONFLICT(post, tag) DO NOTHING",
            )?;

            for tag in post.tag_names() {
                insert_tag.execute(params![tag])?;
                tags_linked += link_tag.execute(params![hash, tag, CRAWLER_ACCOUNT])?;
            }
        }

        tx.commit()?;

        Ok(PersistOutcome::Stored {
            crawl_info_id,
            post_created,
            tags_linked,
        })
    }

    // ===== Queries =====

    fn get_post_by_hash(&self, hash: &str) -> StorageResult<Option<PostRecord>> {
        let post = self
            .conn
            .query_row(
                "SELECT id, uploader, hash, crawl_info, source FROM post WHERE hash = ?1",
                params![hash],
                |row| {
                    Ok(PostRecord {
                        id: row.get(0)?,
                        uploader: row.get(1)?,
                        hash: row.get(2)?,
                        crawl_info: row.get(3)?,
                        source: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(post)
    }

    fn get_post_tags(&self, post_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM post_tag pt
             JOIN tag t ON t.id = pt.tag
             WHERE pt.post = ?1
             ORDER BY t.name",
        )?;

        let tags = stmt
            .query_map(params![post_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(tags)
    }

    // ===== Statistics =====

    fn count_posts(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM post")
    }

    fn count_tags(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM tag")
    }

    fn count_post_tags(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM post_tag")
    }

    fn count_crawl_infos(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM post_crawl_info")
    }

    fn get_top_tags(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, COUNT(pt.id) AS uses FROM tag t
             JOIN post_tag pt ON pt.tag = t.id
             GROUP BY t.id
             ORDER BY uses DESC, t.name ASC
             LIMIT ?1",
        )?;

        let tags = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}
