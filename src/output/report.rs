//! Crawl progress report

use crate::storage::Store;

/// Snapshot of crawl progress
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// URL counts per lifecycle status, alphabetical
    pub url_status_counts: Vec<(String, u64)>,

    /// Extracted structured-data counts per item type, most frequent first
    pub microdata_type_counts: Vec<(String, u64)>,
}

impl CrawlReport {
    pub fn total_urls(&self) -> u64 {
        self.url_status_counts.iter().map(|(_, c)| c).sum()
    }

    pub fn total_microdata(&self) -> u64 {
        self.microdata_type_counts.iter().map(|(_, c)| c).sum()
    }
}

/// Loads a progress report from the store
pub fn load_report<S: Store>(store: &S) -> crate::Result<CrawlReport> {
    Ok(CrawlReport {
        url_status_counts: store.url_status_counts()?,
        microdata_type_counts: store.microdata_type_counts()?,
    })
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("URLs by status ({} total):", report.total_urls());
    for (status, count) in &report.url_status_counts {
        let percentage = if report.total_urls() > 0 {
            (*count as f64 / report.total_urls() as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!(
        "Structured data by type ({} total):",
        report.total_microdata()
    );
    if report.microdata_type_counts.is_empty() {
        println!("  (none extracted yet)");
    }
    for (item_type, count) in &report.microdata_type_counts {
        println!("  {}: {}", item_type, count);
    }
}
