//! Page extraction
//!
//! Extraction is a capability: each scraper receives every claimed page and
//! pulls out what it understands. The shipped scrapers harvest outgoing
//! links for the frontier and microdata items for the structured-data
//! collection; new extractors plug in by implementing [`Scraper`].

mod microdata;
mod url_scraper;

pub use microdata::MicrodataScraper;
pub use url_scraper::UrlScraper;

use url::Url;

/// A single extraction capability applied to every claimed page
pub trait Scraper {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extracts from one page, returning a one-line summary for logging
    fn extract_from(&mut self, url: &Url, html: &str) -> crate::Result<String>;
}
