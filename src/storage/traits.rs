//! Store trait and error types
//!
//! This module defines the trait interface for the shared crawl store and
//! associated error types.

use crate::storage::{HostRecord, MicrodataDocument, UrlRecord};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl store backends
///
/// The methods map one-to-one onto the store primitives the schedulers
/// consume. Batched methods are issued best-effort by callers: a failure is
/// logged and tolerated, never treated as a scheduling error. Duplicate-key
/// conflicts from concurrent processes resolve as success.
pub trait Store {
    // ===== Host collection =====

    /// Queries up to `limit` crawl-eligible hosts, oldest-fetched first
    ///
    /// A host qualifies when its status is `ok` and its `last_fetched_at` is
    /// unset or older than `cutoff_ms`.
    fn crawlable_hosts(&self, cutoff_ms: i64, limit: usize) -> StorageResult<Vec<HostRecord>>;

    /// Stamps `last_fetched_at = now_ms` for the given hosts (batched)
    fn stamp_hosts_fetched(&mut self, ids: &[i64], now_ms: i64) -> StorageResult<()>;

    /// Inserts a host if absent, leaving existing fields untouched
    ///
    /// Returns true if a new host document was inserted.
    fn upsert_host(&mut self, hostname: &str) -> StorageResult<bool>;

    /// Returns the single oldest-updated host due for a metadata refresh
    ///
    /// A host qualifies when its status is unset or its `last_updated_at` is
    /// unset or older than `cutoff_ms`.
    fn next_host_to_update(&self, cutoff_ms: i64) -> StorageResult<Option<HostRecord>>;

    /// Persists refreshed robots.txt and status, stamping `last_updated_at`
    ///
    /// Returns true if the host document was modified.
    fn update_host(&mut self, host: &HostRecord, now_ms: i64) -> StorageResult<bool>;

    /// Marks a host `done`; its URL backlog is exhausted
    fn mark_host_done(&mut self, hostname: &str) -> StorageResult<()>;

    // ===== URL collection =====

    /// Queries up to `limit` URLs with no status set for the given host
    fn url_batch_for_host(&self, hostname: &str, limit: usize) -> StorageResult<Vec<String>>;

    /// Flips the given URLs to `fetching` (batched)
    fn stamp_urls_fetching(&mut self, urls: &[String]) -> StorageResult<()>;

    /// Marks a URL `blocked` (robots.txt disallowed it)
    fn mark_url_blocked(&mut self, url: &str) -> StorageResult<()>;

    /// Upserts `(url, host)` pairs, inserting only absent URLs (batched)
    fn upsert_urls(&mut self, pairs: &[(String, String)]) -> StorageResult<()>;

    /// Stores compressed page content and flips the URL to `fetched`
    ///
    /// Returns true if exactly one record was modified.
    fn store_page_content(&mut self, url: &str, content: &[u8]) -> StorageResult<bool>;

    /// Atomically claims one `fetched` record, flipping it to `scraping`
    fn claim_next_fetched(&mut self) -> StorageResult<Option<UrlRecord>>;

    /// Flips a URL to `scraped` and discards its stored content
    fn mark_url_scraped(&mut self, url: &str) -> StorageResult<()>;

    /// Resets specific in-flight `fetching` URLs back to unset (batched)
    ///
    /// Shutdown path: releases URLs still held in in-memory batches.
    fn reset_urls_to_new(&mut self, urls: &[String]) -> StorageResult<()>;

    /// Recovery sweep: all `fetching` records back to unset
    fn reset_fetching(&mut self) -> StorageResult<usize>;

    /// Recovery sweep: all `scraping` records back to `fetched`
    fn reset_scraping(&mut self) -> StorageResult<usize>;

    /// Returns up to `limit` stored URLs, for known-URL cache preloading
    fn known_urls(&self, limit: usize) -> StorageResult<Vec<String>>;

    /// Looks up a single URL record (content included)
    fn get_url_record(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    // ===== Aggregates (reporting only) =====

    /// URL counts grouped by status, unset reported as "new"
    fn url_status_counts(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Structured-data collection =====

    /// Upserts extracted documents keyed by digest (batched)
    fn upsert_microdata(&mut self, docs: &[MicrodataDocument]) -> StorageResult<()>;

    /// Structured-data counts grouped by item type, most frequent first
    fn microdata_type_counts(&self) -> StorageResult<Vec<(String, u64)>>;
}
