//! Fetcher driver

use crate::config::types::FetchConfig;
use crate::frontier::UrlFrontier;
use crate::runner::{Backoff, FaultReporter, StopSignal};
use crate::storage::Store;
use crate::TrawlerError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Idle backoff bounds for the fetch loop; a fetcher near the front of a
/// backlog should notice new work almost immediately
const BACKOFF_MIN_MS: u64 = 10;
const BACKOFF_MAX_MS: u64 = 3_000;

/// Pulls URLs from the frontier, fetches them, and stores page bodies
///
/// One fetcher owns its frontier exclusively; the politeness pacing lives in
/// the frontier itself. Transport failures abandon the URL (the startup
/// recovery sweep reclaims it) and are handed to the fault reporter; only
/// store errors terminate the loop.
pub struct PageFetcher<S: Store> {
    frontier: UrlFrontier<S>,
    client: Client,
    config: FetchConfig,
    reporter: FaultReporter,
}

impl<S: Store> PageFetcher<S> {
    pub fn new(
        frontier: UrlFrontier<S>,
        config: FetchConfig,
        reporter: FaultReporter,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(TrawlerError::Client)?;

        Ok(Self {
            frontier,
            client,
            config,
            reporter,
        })
    }

    /// Runs the fetch loop until stopped or the store fails
    pub async fn run(&mut self, stop: StopSignal) -> crate::Result<()> {
        let mut backoff = Backoff::new(BACKOFF_MIN_MS, BACKOFF_MAX_MS);

        while !stop.is_stopped() {
            match self.frontier.get_next_url().await {
                Ok(Some(url)) => {
                    backoff.reset();
                    if let Err(e) = self.fetch_one(&url).await {
                        if e.is_fatal() {
                            self.frontier.drain();
                            return Err(e);
                        }
                        self.reporter.report(&e);
                    }
                }
                Ok(None) => backoff.wait().await,
                Err(e) => {
                    self.frontier.drain();
                    return Err(e);
                }
            }
        }

        self.frontier.drain();
        Ok(())
    }

    /// Fetches one URL and stores its body
    ///
    /// Pages with an unacceptable content type or language are stored with an
    /// empty body: the URL still advances through its lifecycle, it just
    /// yields nothing to scrape.
    async fn fetch_one(&mut self, url: &str) -> crate::Result<()> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify_error(url, e))?;

        if !self.acceptable_content_type(&response) {
            tracing::info!("Skipping {} (unacceptable content type)", url);
            self.frontier.add_page(url, "")?;
            return Ok(());
        }
        if !self.acceptable_language(&response) {
            tracing::info!("Skipping {} (unacceptable content language)", url);
            self.frontier.add_page(url, "")?;
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;
        let body = squash_whitespace(&body);

        self.frontier.add_page(url, &body)?;
        tracing::info!("Fetched {} ({} bytes)", url, body.len());
        Ok(())
    }

    /// The Content-Type value must start with one of the accepted types;
    /// parameters such as charset are ignored
    fn acceptable_content_type(&self, response: &Response) -> bool {
        let Some(content_type) = header_value(response, "content-type") else {
            return true;
        };
        self.config
            .accept_content_types
            .iter()
            .any(|accepted| content_type.starts_with(accepted.as_str()))
    }

    /// A missing Content-Language header passes; otherwise some declared tag
    /// must match an accepted language by its primary subtag
    fn acceptable_language(&self, response: &Response) -> bool {
        let Some(languages) = header_value(response, "content-language") else {
            return true;
        };
        languages.split(',').any(|tag| {
            let tag = tag.trim();
            let primary = tag.split('-').next().unwrap_or(tag);
            self.config
                .accept_languages
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(primary))
        })
    }
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
}

fn classify_error(url: &str, error: reqwest::Error) -> TrawlerError {
    if error.is_timeout() {
        TrawlerError::Timeout {
            url: url.to_string(),
        }
    } else {
        TrawlerError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Collapses whitespace runs before storage; markup survives, layout noise
/// does not
fn squash_whitespace(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_whitespace = false;
    for c in body.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}
