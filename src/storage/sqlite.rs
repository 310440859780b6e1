//! SQLite store implementation
//!
//! This module provides a SQLite-based implementation of the [`Store`] trait.
//! Batched writes run inside one transaction per call; in-process they are
//! atomic, but callers still treat them as best-effort and log rather than
//! escalate when they fail.

use crate::state::UrlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageResult};
use crate::storage::{HostRecord, MicrodataDocument, UrlRecord};
use crate::state::HostStatus;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite store backend
pub struct SqliteStorage {
    conn: Connection,
}

const HOST_COLUMNS: &str = "id, hostname, status, robots_txt, last_fetched_at, last_updated_at";
const URL_COLUMNS: &str = "id, url, host, status, content";

impl SqliteStorage {
    /// Opens or creates the store database at the given path
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory store (tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn map_host_row(row: &Row<'_>) -> rusqlite::Result<HostRecord> {
        Ok(HostRecord {
            id: row.get(0)?,
            hostname: row.get(1)?,
            status: row
                .get::<_, Option<String>>(2)?
                .as_deref()
                .and_then(HostStatus::from_db_string),
            robots_txt: row.get(3)?,
            last_fetched_at: row.get(4)?,
            last_updated_at: row.get(5)?,
        })
    }

    fn map_url_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
        Ok(UrlRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            host: row.get(2)?,
            status: UrlStatus::from_db_string(row.get::<_, Option<String>>(3)?.as_deref())
                .unwrap_or(UrlStatus::New),
            content: row.get(4)?,
        })
    }
}

impl Store for SqliteStorage {
    // ===== Host collection =====

    fn crawlable_hosts(&self, cutoff_ms: i64, limit: usize) -> StorageResult<Vec<HostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HOST_COLUMNS} FROM hosts
             WHERE status = 'ok'
               AND (last_fetched_at IS NULL OR last_fetched_at < ?1)
             ORDER BY last_fetched_at ASC
             LIMIT ?2"
        ))?;

        let hosts = stmt
            .query_map(params![cutoff_ms, limit as i64], Self::map_host_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hosts)
    }

    fn stamp_hosts_fetched(&mut self, ids: &[i64], now_ms: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE hosts SET last_fetched_at = ?1 WHERE id = ?2")?;
            for id in ids {
                stmt.execute(params![now_ms, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_host(&mut self, hostname: &str) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO hosts (hostname, status) VALUES (?1, 'ok')
             ON CONFLICT(hostname) DO NOTHING",
            params![hostname],
        )?;
        Ok(inserted == 1)
    }

    fn next_host_to_update(&self, cutoff_ms: i64) -> StorageResult<Option<HostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HOST_COLUMNS} FROM hosts
             WHERE status IS NULL
                OR last_updated_at IS NULL
                OR last_updated_at < ?1
             ORDER BY last_updated_at ASC
             LIMIT 1"
        ))?;

        let host = stmt
            .query_row(params![cutoff_ms], Self::map_host_row)
            .optional()?;
        Ok(host)
    }

    fn update_host(&mut self, host: &HostRecord, now_ms: i64) -> StorageResult<bool> {
        let modified = self.conn.execute(
            "UPDATE hosts SET robots_txt = ?1, status = ?2, last_updated_at = ?3 WHERE id = ?4",
            params![
                host.robots_txt,
                host.status.map(|s| s.to_db_string()),
                now_ms,
                host.id
            ],
        )?;
        Ok(modified == 1)
    }

    fn mark_host_done(&mut self, hostname: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE hosts SET status = 'done' WHERE hostname = ?1",
            params![hostname],
        )?;
        Ok(())
    }

    // ===== URL collection =====

    fn url_batch_for_host(&self, hostname: &str, limit: usize) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url FROM urls
             WHERE host = ?1 AND status IS NULL
             ORDER BY id
             LIMIT ?2",
        )?;

        let urls = stmt
            .query_map(params![hostname, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    fn stamp_urls_fetching(&mut self, urls: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE urls SET status = 'fetching' WHERE url = ?1")?;
            for url in urls {
                stmt.execute(params![url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn mark_url_blocked(&mut self, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET status = 'blocked' WHERE url = ?1",
            params![url],
        )?;
        Ok(())
    }

    fn upsert_urls(&mut self, pairs: &[(String, String)]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO urls (url, host) VALUES (?1, ?2)
                 ON CONFLICT(url) DO NOTHING",
            )?;
            for (url, host) in pairs {
                stmt.execute(params![url, host])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn store_page_content(&mut self, url: &str, content: &[u8]) -> StorageResult<bool> {
        let modified = self.conn.execute(
            "UPDATE urls SET status = 'fetched', content = ?2 WHERE url = ?1",
            params![url, content],
        )?;
        Ok(modified == 1)
    }

    fn claim_next_fetched(&mut self) -> StorageResult<Option<UrlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE urls SET status = 'scraping'
             WHERE id = (SELECT id FROM urls WHERE status = 'fetched' ORDER BY id LIMIT 1)
             RETURNING {URL_COLUMNS}"
        ))?;

        let record = stmt.query_row([], Self::map_url_row).optional()?;
        Ok(record)
    }

    fn mark_url_scraped(&mut self, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE urls SET status = 'scraped', content = NULL WHERE url = ?1",
            params![url],
        )?;
        Ok(())
    }

    fn reset_urls_to_new(&mut self, urls: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx
                .prepare("UPDATE urls SET status = NULL WHERE url = ?1 AND status = 'fetching'")?;
            for url in urls {
                stmt.execute(params![url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn reset_fetching(&mut self) -> StorageResult<usize> {
        let reset = self
            .conn
            .execute("UPDATE urls SET status = NULL WHERE status = 'fetching'", [])?;
        Ok(reset)
    }

    fn reset_scraping(&mut self) -> StorageResult<usize> {
        let reset = self.conn.execute(
            "UPDATE urls SET status = 'fetched' WHERE status = 'scraping'",
            [],
        )?;
        Ok(reset)
    }

    fn known_urls(&self, limit: usize) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM urls ORDER BY id LIMIT ?1")?;
        let urls = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    fn get_url_record(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {URL_COLUMNS} FROM urls WHERE url = ?1"))?;
        let record = stmt.query_row(params![url], Self::map_url_row).optional()?;
        Ok(record)
    }

    // ===== Aggregates =====

    fn url_status_counts(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(status, 'new') AS s, COUNT(*) FROM urls
             GROUP BY s ORDER BY s",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    // ===== Structured-data collection =====

    fn upsert_microdata(&mut self, docs: &[MicrodataDocument]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO microdata (digest, url, item_type, document)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(digest) DO UPDATE SET url = excluded.url",
            )?;
            for doc in docs {
                stmt.execute(params![doc.digest, doc.url, doc.item_type, doc.document])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn microdata_type_counts(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(item_type, '(untyped)') AS t, COUNT(*) AS c FROM microdata
             GROUP BY t ORDER BY c DESC, t",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}
