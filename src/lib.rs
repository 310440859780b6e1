//! Trawler: a distributed crawl frontier and politeness scheduler
//!
//! Independent fetcher, host-refresher, and scraper processes pull work from
//! a shared persistent store, observe crawl politeness rules, and feed
//! discovered links back into the same store. This crate implements the host
//! registry, the URL frontier, the link-acceptance filter, and the poll-loop
//! drivers that wire them to HTTP and HTML collaborators.

pub mod cache;
pub mod config;
pub mod filter;
pub mod frontier;
pub mod hosts;
pub mod output;
pub mod robots;
pub mod runner;
pub mod scrape;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Trawler operations
#[derive(Debug, Error)]
pub enum TrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Page content error for {url}: {message}")]
    PageContent { url: String, message: String },

    #[error("Scraper error for {url}: {message}")]
    Scrape { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrawlerError {
    /// Returns true if this error must terminate the process.
    ///
    /// Store connectivity loss is the only escalating class; transport and
    /// extraction faults are reported and the current item abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Trawler operations
pub type Result<T> = std::result::Result<T, TrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{HostStatus, UrlStatus};
