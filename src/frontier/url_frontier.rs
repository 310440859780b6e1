//! Frontier scheduling over the shared store

use crate::cache::BoundedSet;
use crate::config::types::{FrontierConfig, HostsConfig};
use crate::frontier::compress::{compress, decompress};
use crate::frontier::rotation::HostRotation;
use crate::hosts::HostRegistry;
use crate::robots::ParsedRobots;
use crate::storage::Store;
use crate::TrawlerError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

/// A claimed page ready for extraction
#[derive(Debug)]
pub struct Page {
    pub url: String,
    /// Origin the URL belongs to
    pub host: String,
    pub html: String,
}

/// Schedules URLs politely across hosts and carries the page pipeline
///
/// One frontier instance serves one process. Fetcher processes call
/// [`get_next_url`](Self::get_next_url) and [`add_page`](Self::add_page);
/// scraper processes call [`get_next_page`](Self::get_next_page),
/// [`add_urls`](Self::add_urls), and
/// [`finished_scraping`](Self::finished_scraping). Coordination between
/// processes happens entirely through the store.
pub struct UrlFrontier<S: Store> {
    store: Arc<Mutex<S>>,
    registry: HostRegistry<S>,
    rotation: HostRotation,
    /// Per-host URL batches, served in store order
    url_batches: HashMap<String, VecDeque<String>>,
    /// Robots rules for hosts currently in the rotation
    robots: HashMap<String, ParsedRobots>,
    known_urls: BoundedSet<String>,
    /// Discovered (url, host) pairs awaiting a batched upsert
    pending_writes: Vec<(String, String)>,
    max_pending_writes: usize,
    user_agent: String,
}

impl<S: Store> UrlFrontier<S> {
    pub fn new(
        store: Arc<Mutex<S>>,
        frontier_config: &FrontierConfig,
        hosts_config: HostsConfig,
        user_agent: String,
    ) -> crate::Result<Self> {
        let registry = HostRegistry::new(Arc::clone(&store), hosts_config);
        let rotation = HostRotation::new(
            frontier_config.batch_size,
            frontier_config.max_batch_size,
            frontier_config.auto_grow_batch_size,
            frontier_config.crawl_delay_ms,
        );

        let mut known_urls = BoundedSet::new(frontier_config.max_known_urls);
        if frontier_config.preload_known_urls {
            // half capacity, leaving headroom before the first eviction
            let urls = store
                .lock()
                .unwrap()
                .known_urls(frontier_config.max_known_urls / 2)?;
            tracing::info!("Preloaded {} known URLs", urls.len());
            for url in urls {
                known_urls.insert(url);
            }
        }

        Ok(Self {
            store,
            registry,
            rotation,
            url_batches: HashMap::new(),
            robots: HashMap::new(),
            known_urls,
            pending_writes: Vec::new(),
            max_pending_writes: frontier_config.max_pending_writes,
            user_agent,
        })
    }

    /// Returns the next URL to fetch, or None when no host has work
    ///
    /// Consecutive calls rotate across hosts; a full pass over the rotation
    /// that handed out any URL sleeps off the rest of the crawl-delay budget
    /// before the next pass begins. Hosts whose backlog turns out empty are
    /// marked done and dropped from the rotation.
    pub async fn get_next_url(&mut self) -> crate::Result<Option<String>> {
        loop {
            if self.rotation.cycle_complete() {
                if let Some(pause) = self.rotation.finish_cycle() {
                    tracing::debug!("Politeness pause of {:?} before next cycle", pause);
                    tokio::time::sleep(pause).await;
                }
            }

            self.fill_rotation()?;

            let Some(hostname) = self.rotation.advance() else {
                return Ok(None);
            };

            match self.next_url_for_host(&hostname)? {
                Some(url) => {
                    self.rotation.record_handout();
                    return Ok(Some(url));
                }
                None => {
                    self.rotation.remove(&hostname);
                    self.url_batches.remove(&hostname);
                    self.robots.remove(&hostname);
                    self.registry.mark_done(&hostname)?;
                }
            }
        }
    }

    /// Tops the rotation up to capacity from the host registry
    fn fill_rotation(&mut self) -> crate::Result<()> {
        while self.rotation.has_room() {
            let Some(host) = self.registry.next_host_to_crawl()? else {
                break;
            };
            if self.rotation.contains(&host.hostname) {
                continue;
            }
            self.robots.insert(
                host.hostname.clone(),
                ParsedRobots::from_stored(host.robots_txt.as_deref()),
            );
            self.rotation.push(host.hostname);
        }
        Ok(())
    }

    /// Pops the host's next robots-allowed URL, refilling its batch once
    ///
    /// Robots-disallowed URLs are marked blocked and skipped. Returns None
    /// when the host's backlog is exhausted.
    fn next_url_for_host(&mut self, hostname: &str) -> crate::Result<Option<String>> {
        let mut refilled = false;
        loop {
            let next = self
                .url_batches
                .get_mut(hostname)
                .and_then(|batch| batch.pop_front());

            if let Some(url) = next {
                let allowed = self
                    .robots
                    .get(hostname)
                    .map(|robots| robots.is_allowed(&url, &self.user_agent))
                    .unwrap_or(true);
                if allowed {
                    return Ok(Some(url));
                }
                tracing::info!("URL {} disallowed by robots.txt", url);
                self.store.lock().unwrap().mark_url_blocked(&url)?;
                continue;
            }

            if refilled {
                return Ok(None);
            }
            if self.refill_url_batch(hostname)? == 0 {
                return Ok(None);
            }
            refilled = true;
        }
    }

    fn refill_url_batch(&mut self, hostname: &str) -> crate::Result<usize> {
        let limit = self.rotation.capacity();
        let mut store = self.store.lock().unwrap();
        let urls = store.url_batch_for_host(hostname, limit)?;
        if urls.is_empty() {
            return Ok(0);
        }

        if let Err(e) = store.stamp_urls_fetching(&urls) {
            tracing::warn!("Failed to stamp {} URLs as fetching: {}", urls.len(), e);
        }
        drop(store);

        let count = urls.len();
        self.url_batches
            .insert(hostname.to_string(), urls.into_iter().collect());
        Ok(count)
    }

    /// Feeds discovered links back into the frontier
    ///
    /// URLs already seen this process lifetime are dropped; the rest are
    /// buffered per the pending-write threshold and upserted in batches, with
    /// their host origins registered along the way. Returns how many URLs
    /// were new to this process.
    pub fn add_urls(&mut self, urls: &[Url]) -> crate::Result<usize> {
        let mut added = 0;
        for url in urls {
            let origin = url.origin();
            if !origin.is_tuple() {
                continue;
            }
            let url_string = url.as_str().to_string();
            if !self.known_urls.insert(url_string.clone()) {
                continue;
            }

            let origin = origin.ascii_serialization();
            self.registry.add_host(&origin)?;
            self.pending_writes.push((url_string, origin));
            added += 1;
        }

        if self.pending_writes.len() >= self.max_pending_writes {
            self.flush_pending_writes();
        }
        Ok(added)
    }

    /// Issues the buffered URL upserts, tolerating failure
    fn flush_pending_writes(&mut self) {
        if self.pending_writes.is_empty() {
            return;
        }
        let result = self.store.lock().unwrap().upsert_urls(&self.pending_writes);
        if let Err(e) = result {
            tracing::warn!(
                "Dropped a batch of {} URL upserts: {}",
                self.pending_writes.len(),
                e
            );
        }
        self.pending_writes.clear();
    }

    /// Stores a fetched page body, compressed, advancing the URL to fetched
    pub fn add_page(&mut self, url: &str, body: &str) -> crate::Result<bool> {
        let packed = compress(body.as_bytes())?;
        let stored = self.store.lock().unwrap().store_page_content(url, &packed)?;
        if !stored {
            tracing::warn!("No record matched when storing content for {}", url);
        }
        Ok(stored)
    }

    /// Claims the next fetched page for extraction
    ///
    /// The claim is atomic in the store, so concurrent scraper processes
    /// never receive the same page.
    pub fn get_next_page(&mut self) -> crate::Result<Option<Page>> {
        let record = self.store.lock().unwrap().claim_next_fetched()?;
        let Some(record) = record else {
            return Ok(None);
        };

        let packed = record.content.as_deref().ok_or_else(|| TrawlerError::PageContent {
            url: record.url.clone(),
            message: "claimed page has no stored content".to_string(),
        })?;
        let bytes = decompress(packed).map_err(|e| TrawlerError::PageContent {
            url: record.url.clone(),
            message: format!("failed to decompress stored content: {}", e),
        })?;

        self.known_urls.insert(record.url.clone());
        Ok(Some(Page {
            url: record.url,
            host: record.host,
            html: String::from_utf8_lossy(&bytes).into_owned(),
        }))
    }

    /// Completes a page's lifecycle, discarding its stored content
    pub fn finished_scraping(&mut self, url: &str) -> crate::Result<()> {
        self.store.lock().unwrap().mark_url_scraped(url)?;
        Ok(())
    }

    /// Releases in-memory state back to the store on shutdown
    ///
    /// Buffered upserts are flushed and URLs still sitting in local batches
    /// (stamped fetching but never handed out) are reset so another process
    /// can pick them up. Best-effort; a failed drain is recovered by the
    /// startup sweeps.
    pub fn drain(&mut self) {
        self.flush_pending_writes();

        let held: Vec<String> = self
            .url_batches
            .drain()
            .flat_map(|(_, batch)| batch)
            .collect();
        if held.is_empty() {
            return;
        }
        tracing::info!("Releasing {} undispatched URLs", held.len());
        if let Err(e) = self.store.lock().unwrap().reset_urls_to_new(&held) {
            tracing::warn!("Failed to release {} undispatched URLs: {}", held.len(), e);
        }
    }

    /// Startup sweep for fetcher processes: abandoned fetches back to new
    pub fn recover_fetching(&mut self) -> crate::Result<usize> {
        let reset = self.store.lock().unwrap().reset_fetching()?;
        if reset > 0 {
            tracing::info!("Recovered {} URLs stuck in fetching", reset);
        }
        Ok(reset)
    }

    /// Startup sweep for scraper processes: abandoned claims back to fetched
    pub fn recover_scraping(&mut self) -> crate::Result<usize> {
        let reset = self.store.lock().unwrap().reset_scraping()?;
        if reset > 0 {
            tracing::info!("Recovered {} URLs stuck in scraping", reset);
        }
        Ok(reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UrlStatus;
    use crate::storage::SqliteStorage;

    fn test_store() -> Arc<Mutex<SqliteStorage>> {
        Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()))
    }

    fn test_frontier(store: Arc<Mutex<SqliteStorage>>) -> UrlFrontier<SqliteStorage> {
        let frontier_config = FrontierConfig {
            batch_size: 2,
            max_batch_size: 8,
            auto_grow_batch_size: false,
            crawl_delay_ms: 0,
            max_pending_writes: 1,
            ..FrontierConfig::default()
        };
        let hosts_config = HostsConfig {
            crawl_delay_ms: 0,
            ..HostsConfig::default()
        };
        UrlFrontier::new(store, &frontier_config, hosts_config, "Trawler/1.0".to_string())
            .unwrap()
    }

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn status_of(store: &Arc<Mutex<SqliteStorage>>, url: &str) -> UrlStatus {
        store
            .lock()
            .unwrap()
            .get_url_record(url)
            .unwrap()
            .unwrap()
            .status
    }

    #[test]
    fn test_add_urls_registers_host_and_persists() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));

        let added = frontier
            .add_urls(&[parse("https://example.test/a"), parse("https://example.test/b")])
            .unwrap();
        assert_eq!(added, 2);

        let batch = store
            .lock()
            .unwrap()
            .url_batch_for_host("https://example.test", 10)
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_add_urls_is_idempotent() {
        let store = test_store();
        let mut frontier = test_frontier(store);

        let urls = [parse("https://example.test/a")];
        assert_eq!(frontier.add_urls(&urls).unwrap(), 1);
        assert_eq!(frontier.add_urls(&urls).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_next_url_serves_backlog_then_marks_done() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        frontier
            .add_urls(&[parse("https://example.test/a"), parse("https://example.test/b")])
            .unwrap();

        assert_eq!(
            frontier.get_next_url().await.unwrap().as_deref(),
            Some("https://example.test/a")
        );
        assert_eq!(
            frontier.get_next_url().await.unwrap().as_deref(),
            Some("https://example.test/b")
        );
        assert_eq!(frontier.get_next_url().await.unwrap(), None);

        // served URLs are claimed, and the exhausted host is done
        assert_eq!(
            status_of(&store, "https://example.test/a"),
            UrlStatus::Fetching
        );
        assert!(store
            .lock()
            .unwrap()
            .crawlable_hosts(i64::MAX, 10)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fetches_alternate_across_hosts() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        frontier
            .add_urls(&[
                parse("https://a.test/1"),
                parse("https://a.test/2"),
                parse("https://b.test/1"),
                parse("https://b.test/2"),
            ])
            .unwrap();

        let mut hosts = Vec::new();
        for _ in 0..4 {
            let url = frontier.get_next_url().await.unwrap().unwrap();
            hosts.push(parse(&url).host_str().unwrap().to_string());
        }
        // no host is hit twice in a row
        for pair in hosts.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn test_robots_disallowed_urls_are_blocked_not_served() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        frontier
            .add_urls(&[
                parse("https://example.test/private/secret"),
                parse("https://example.test/open"),
            ])
            .unwrap();

        {
            let mut locked = store.lock().unwrap();
            let mut host = locked.next_host_to_update(0).unwrap().unwrap();
            host.robots_txt = Some("User-agent: *\nDisallow: /private".to_string());
            host.status = Some(crate::HostStatus::Ok);
            locked.update_host(&host, 1).unwrap();
        }

        assert_eq!(
            frontier.get_next_url().await.unwrap().as_deref(),
            Some("https://example.test/open")
        );
        assert_eq!(
            status_of(&store, "https://example.test/private/secret"),
            UrlStatus::Blocked
        );
    }

    #[test]
    fn test_page_pipeline_roundtrip() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        frontier.add_urls(&[parse("https://example.test/a")]).unwrap();

        let body = "<html><body><a href=\"/next\">next</a></body></html>";
        assert!(frontier.add_page("https://example.test/a", body).unwrap());

        let page = frontier.get_next_page().unwrap().unwrap();
        assert_eq!(page.url, "https://example.test/a");
        assert_eq!(page.host, "https://example.test");
        assert_eq!(page.html, body);

        frontier.finished_scraping(&page.url).unwrap();
        assert_eq!(status_of(&store, "https://example.test/a"), UrlStatus::Scraped);
        assert!(frontier.get_next_page().unwrap().is_none());
    }

    #[test]
    fn test_add_page_for_unknown_url_reports_false() {
        let store = test_store();
        let mut frontier = test_frontier(store);
        assert!(!frontier.add_page("https://nowhere.test/x", "<html></html>").unwrap());
    }

    #[tokio::test]
    async fn test_drain_releases_undispatched_urls() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        frontier
            .add_urls(&[parse("https://example.test/a"), parse("https://example.test/b")])
            .unwrap();

        // first dequeue stamps the whole batch as fetching
        frontier.get_next_url().await.unwrap().unwrap();
        assert_eq!(
            status_of(&store, "https://example.test/b"),
            UrlStatus::Fetching
        );

        frontier.drain();
        assert_eq!(status_of(&store, "https://example.test/b"), UrlStatus::New);
        // the URL actually handed out stays claimed
        assert_eq!(
            status_of(&store, "https://example.test/a"),
            UrlStatus::Fetching
        );
    }

    #[test]
    fn test_recovery_sweeps() {
        let store = test_store();
        let mut frontier = test_frontier(Arc::clone(&store));
        {
            let mut locked = store.lock().unwrap();
            locked
                .upsert_urls(&[
                    ("https://a.test/1".to_string(), "https://a.test".to_string()),
                    ("https://a.test/2".to_string(), "https://a.test".to_string()),
                ])
                .unwrap();
            locked
                .stamp_urls_fetching(&["https://a.test/1".to_string()])
                .unwrap();
            locked.store_page_content("https://a.test/2", b"x").unwrap();
            locked.claim_next_fetched().unwrap();
        }

        assert_eq!(frontier.recover_fetching().unwrap(), 1);
        assert_eq!(frontier.recover_scraping().unwrap(), 1);
        assert_eq!(status_of(&store, "https://a.test/1"), UrlStatus::New);
        assert_eq!(status_of(&store, "https://a.test/2"), UrlStatus::Fetched);
    }

    #[test]
    fn test_non_hierarchical_urls_are_dropped() {
        let store = test_store();
        let mut frontier = test_frontier(store);
        let added = frontier
            .add_urls(&[parse("mailto:someone@example.test")])
            .unwrap();
        assert_eq!(added, 0);
    }
}
