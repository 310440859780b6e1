//! Host registry over the shared store

use crate::cache::BoundedSet;
use crate::config::types::HostsConfig;
use crate::storage::{now_ms, HostRecord, Store};
use std::sync::{Arc, Mutex};

/// Serves crawl-eligible hosts in batches and registers newly seen hosts
///
/// Dequeued batches are stamped `last_fetched_at` up front, so concurrent
/// frontier processes skip hosts another process already holds. The stamp is
/// best-effort: a failed stamp is logged and the batch is still served, which
/// at worst costs some politeness against a sibling process, never
/// correctness.
pub struct HostRegistry<S: Store> {
    store: Arc<Mutex<S>>,
    config: HostsConfig,
    /// Local batch, served newest-query-position first
    batch: Vec<HostRecord>,
    /// Hostnames already registered this process lifetime
    known_hosts: BoundedSet<String>,
}

impl<S: Store> HostRegistry<S> {
    pub fn new(store: Arc<Mutex<S>>, config: HostsConfig) -> Self {
        let max_known = config.max_known_hosts;
        Self {
            store,
            config,
            batch: Vec::new(),
            known_hosts: BoundedSet::new(max_known),
        }
    }

    /// Returns the next host due for crawling, or None when none qualify
    ///
    /// A host qualifies once its last dequeue is older than the configured
    /// crawl delay. Refills the local batch from the store when empty.
    pub fn next_host_to_crawl(&mut self) -> crate::Result<Option<HostRecord>> {
        if self.batch.is_empty() {
            self.refill_batch()?;
        }
        Ok(self.batch.pop())
    }

    fn refill_batch(&mut self) -> crate::Result<()> {
        let now = now_ms();
        let cutoff = now - self.config.crawl_delay_ms as i64;

        let mut store = self.store.lock().unwrap();
        let hosts = store.crawlable_hosts(cutoff, self.config.batch_size)?;
        if hosts.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = hosts.iter().map(|h| h.id).collect();
        if let Err(e) = store.stamp_hosts_fetched(&ids, now) {
            tracing::warn!("Failed to stamp {} dequeued hosts: {}", ids.len(), e);
        }
        drop(store);

        tracing::debug!("Refilled host batch with {} hosts", hosts.len());
        self.batch = hosts;
        Ok(())
    }

    /// Registers a host origin, inserting it into the store if new
    ///
    /// Returns true if the store gained a new host document. Repeat origins
    /// are answered from the in-memory cache without a store round-trip.
    pub fn add_host(&mut self, origin: &str) -> crate::Result<bool> {
        if self.known_hosts.contains(&origin.to_string()) {
            return Ok(false);
        }

        let inserted = self.store.lock().unwrap().upsert_host(origin)?;
        self.known_hosts.insert(origin.to_string());
        if inserted {
            tracing::debug!("Registered new host {}", origin);
        }
        Ok(inserted)
    }

    /// Returns the host most overdue for a robots/status refresh
    pub fn next_host_to_update(&self) -> crate::Result<Option<HostRecord>> {
        let cutoff = now_ms() - self.config.host_refresh_period_ms as i64;
        let host = self.store.lock().unwrap().next_host_to_update(cutoff)?;
        Ok(host)
    }

    /// Persists a refreshed host record, stamping its update time
    pub fn update_host(&mut self, host: &HostRecord) -> crate::Result<bool> {
        let updated = self.store.lock().unwrap().update_host(host, now_ms())?;
        Ok(updated)
    }

    /// Marks a host finished; the frontier found its URL backlog empty
    pub fn mark_done(&mut self, hostname: &str) -> crate::Result<()> {
        tracing::info!("Host {} has no URLs left, marking done", hostname);
        self.store.lock().unwrap().mark_host_done(hostname)?;
        Ok(())
    }
}
