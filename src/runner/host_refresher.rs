//! Host refresh driver

use crate::config::types::{FetchConfig, HostsConfig};
use crate::hosts::HostRegistry;
use crate::runner::{Backoff, FaultReporter, StopSignal};
use crate::state::HostStatus;
use crate::storage::{HostRecord, Store};
use crate::TrawlerError;
use reqwest::Client;
use std::time::Duration;

/// Host refreshes are periodic maintenance; the loop can afford to idle long
const BACKOFF_MIN_MS: u64 = 1_000;
const BACKOFF_MAX_MS: u64 = 30_000;

/// Keeps each host's robots.txt and status current
///
/// One host per iteration, oldest-updated first, so a long backlog still
/// converges. A host whose robots.txt cannot be fetched gets an empty
/// ruleset stored: robots evaluation fails open, and the fetch is retried at
/// the next refresh period.
pub struct HostRefresher<S: Store> {
    registry: HostRegistry<S>,
    client: Client,
    reporter: FaultReporter,
}

impl<S: Store> HostRefresher<S> {
    pub fn new(
        registry: HostRegistry<S>,
        fetch_config: &FetchConfig,
        reporter: FaultReporter,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(&fetch_config.user_agent)
            .timeout(Duration::from_secs(fetch_config.request_timeout_secs))
            .gzip(true)
            .build()
            .map_err(TrawlerError::Client)?;

        Ok(Self {
            registry,
            client,
            reporter,
        })
    }

    /// Runs the refresh loop until stopped or the store fails
    pub async fn run(&mut self, stop: StopSignal) -> crate::Result<()> {
        let mut backoff = Backoff::new(BACKOFF_MIN_MS, BACKOFF_MAX_MS);

        while !stop.is_stopped() {
            match self.registry.next_host_to_update() {
                Ok(Some(host)) => {
                    backoff.reset();
                    if let Err(e) = self.refresh_one(host).await {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        self.reporter.report(&e);
                    }
                }
                Ok(None) => backoff.wait().await,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn refresh_one(&mut self, mut host: HostRecord) -> crate::Result<()> {
        let robots_url = format!("{}/robots.txt", host.hostname);
        tracing::debug!("Refreshing {}", host.hostname);

        let robots = match self.fetch_robots(&robots_url).await {
            Ok(content) => content,
            Err(e) => {
                self.reporter.report(&e);
                String::new()
            }
        };

        host.robots_txt = Some(robots);
        // a done host comes back crawl-eligible, picking up URLs discovered
        // since its backlog last ran dry
        host.status = Some(match host.effective_status() {
            HostStatus::Done => HostStatus::Ok,
            other => other,
        });
        self.registry.update_host(&host)?;
        tracing::info!("Refreshed host {}", host.hostname);
        Ok(())
    }

    /// Fetches robots.txt content; a missing file is an empty ruleset, not
    /// an error
    async fn fetch_robots(&self, robots_url: &str) -> crate::Result<String> {
        let response = self
            .client
            .get(robots_url)
            .send()
            .await
            .map_err(|e| TrawlerError::Http {
                url: robots_url.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Ok(String::new());
        }
        let content = response.text().await.map_err(|e| TrawlerError::Http {
            url: robots_url.to_string(),
            source: e,
        })?;
        Ok(content)
    }
}
