//! Scraper driver

use crate::frontier::UrlFrontier;
use crate::runner::{Backoff, FaultReporter, StopSignal};
use crate::scrape::Scraper;
use crate::storage::Store;
use std::sync::{Arc, Mutex};
use url::Url;

/// Claimed pages arrive in bursts behind the fetchers; poll eagerly, back
/// off moderately
const BACKOFF_MIN_MS: u64 = 100;
const BACKOFF_MAX_MS: u64 = 5_000;

/// Claims fetched pages and runs every scraper over each one
///
/// The frontier is shared with the link scraper, which feeds discovered URLs
/// back through it; the lock is held per call, never across an await. A
/// scraper failure on one page is reported and the page still completes its
/// lifecycle, so a single malformed page cannot wedge the pipeline.
pub struct ScrapeRunner<S: Store> {
    frontier: Arc<Mutex<UrlFrontier<S>>>,
    scrapers: Vec<Box<dyn Scraper>>,
    reporter: FaultReporter,
}

impl<S: Store> ScrapeRunner<S> {
    pub fn new(
        frontier: Arc<Mutex<UrlFrontier<S>>>,
        scrapers: Vec<Box<dyn Scraper>>,
        reporter: FaultReporter,
    ) -> Self {
        Self {
            frontier,
            scrapers,
            reporter,
        }
    }

    /// Runs the scrape loop until stopped or the store fails
    pub async fn run(&mut self, stop: StopSignal) -> crate::Result<()> {
        let mut backoff = Backoff::new(BACKOFF_MIN_MS, BACKOFF_MAX_MS);

        while !stop.is_stopped() {
            let page = self.frontier.lock().unwrap().get_next_page();
            match page {
                Ok(Some(page)) => {
                    backoff.reset();
                    if let Err(e) = self.scrape_one(&page.url, &page.html) {
                        if e.is_fatal() {
                            self.drain();
                            return Err(e);
                        }
                        self.reporter.report(&e);
                    }
                }
                Ok(None) => backoff.wait().await,
                Err(e) => {
                    self.drain();
                    return Err(e);
                }
            }
        }

        self.drain();
        Ok(())
    }

    fn scrape_one(&mut self, url: &str, html: &str) -> crate::Result<()> {
        let parsed = Url::parse(url)?;

        for scraper in &mut self.scrapers {
            match scraper.extract_from(&parsed, html) {
                Ok(summary) => {
                    tracing::info!("{} [{}] {}", shorten(url), scraper.name(), summary)
                }
                Err(e) => {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    self.reporter.report(&e);
                }
            }
        }

        self.frontier.lock().unwrap().finished_scraping(url)?;
        Ok(())
    }

    fn drain(&mut self) {
        self.frontier.lock().unwrap().drain();
    }
}

/// Keeps log lines readable when URLs carry long query strings
fn shorten(url: &str) -> String {
    const MAX: usize = 96;
    if url.chars().count() <= MAX {
        return url.to_string();
    }
    let cut: String = url.chars().take(MAX - 3).collect();
    format!("{}...", cut)
}
