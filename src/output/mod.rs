//! Crawl reporting
//!
//! Read-only summaries over the store, for operators watching a crawl.

mod report;

pub use report::{load_report, print_report, CrawlReport};
