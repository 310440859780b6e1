//! Storage module for the shared crawl store
//!
//! The persistent store is consumed only through a small set of primitives:
//! filtered queries with sort and limit, an atomic single-record
//! claim-and-update, batched best-effort upserts/updates, and aggregate
//! counts for reporting. The [`Store`] trait captures exactly those
//! primitives; [`SqliteStorage`] is the shipped backend.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Store, StorageError, StorageResult};

use crate::state::{HostStatus, UrlStatus};

/// Returns the current wall-clock time as unix milliseconds
///
/// All persisted timestamps use this representation so that store-side
/// cutoff comparisons stay plain integer comparisons.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Represents a host document in the store
#[derive(Debug, Clone)]
pub struct HostRecord {
    pub id: i64,
    /// URL origin, e.g. `https://www.example.co.nz`
    pub hostname: String,
    /// None until the refresh path first touches the host
    pub status: Option<HostStatus>,
    pub robots_txt: Option<String>,
    /// Unix ms of the last frontier dequeue stamp
    pub last_fetched_at: Option<i64>,
    /// Unix ms of the last robots/status refresh
    pub last_updated_at: Option<i64>,
}

impl HostRecord {
    /// Effective status: hosts are created crawl-eligible
    pub fn effective_status(&self) -> HostStatus {
        self.status.unwrap_or(HostStatus::Ok)
    }
}

/// Represents a URL/page document in the store
#[derive(Debug, Clone)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    /// Origin derived from the URL's authority
    pub host: String,
    pub status: UrlStatus,
    /// Compressed page bytes, present only in `Fetched`/`Scraping`
    pub content: Option<Vec<u8>>,
}

/// An extracted structured-data document, content-addressed by digest
#[derive(Debug, Clone)]
pub struct MicrodataDocument {
    /// SHA-256 hex digest of the canonical JSON representation
    pub digest: String,
    /// URL of the page the data was extracted from
    pub url: String,
    /// Primary item type, used for reporting aggregates
    pub item_type: Option<String>,
    /// Canonical JSON document
    pub document: String,
}
