//! Poll-loop drivers
//!
//! Each crawl role runs as its own process with a single cooperative loop:
//! fetchers pull URLs and store pages, the host refresher keeps robots.txt
//! current, scrapers extract from claimed pages. The loops share the stop
//! and backoff plumbing defined here.

mod host_refresher;
mod page_fetcher;
mod scrape_runner;

pub use host_refresher::HostRefresher;
pub use page_fetcher::PageFetcher;
pub use scrape_runner::ScrapeRunner;

use crate::TrawlerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative shutdown flag shared with the drivers
///
/// Loops check the flag once per iteration and exit between work items, so
/// in-flight store writes always complete.
#[derive(Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a signal that trips on Ctrl-C
    pub fn hooked_to_ctrl_c() -> Self {
        let signal = Self::new();
        let flag = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, finishing current item");
                flag.stop();
            }
        });
        signal
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential idle backoff
///
/// Doubles the wait after every idle poll and resets as soon as work
/// appears, keeping idle processes quiet without delaying fresh work for
/// long.
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            current: Duration::from_millis(min_ms),
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// Sleeps the current interval, then doubles it up to the maximum
    pub async fn wait(&mut self) {
        tokio::time::sleep(self.current).await;
        self.current = (self.current * 2).min(self.max);
    }

    /// Work arrived; the next idle wait starts at the minimum again
    pub fn reset(&mut self) {
        self.current = self.min;
    }

    #[cfg(test)]
    fn current(&self) -> Duration {
        self.current
    }
}

/// Callback for non-fatal faults
///
/// Transport and extraction errors abandon the current item and are handed
/// here instead of terminating the loop. The default reporter writes to the
/// log; deployments can inject their own sink.
pub struct FaultReporter {
    handler: Box<dyn Fn(&TrawlerError) + Send>,
}

impl FaultReporter {
    pub fn new(handler: impl Fn(&TrawlerError) + Send + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Reporter that writes faults to the error log
    pub fn log() -> Self {
        Self::new(|error| tracing::error!("{}", error))
    }

    pub fn report(&self, error: &TrawlerError) {
        (self.handler)(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stop_signal_trips_once_for_all_clones() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_stopped());
        signal.stop();
        assert!(clone.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_to_max() {
        let mut backoff = Backoff::new(10, 35);
        assert_eq!(backoff.current(), Duration::from_millis(10));
        backoff.wait().await;
        assert_eq!(backoff.current(), Duration::from_millis(20));
        backoff.wait().await;
        assert_eq!(backoff.current(), Duration::from_millis(35));
        backoff.wait().await;
        assert_eq!(backoff.current(), Duration::from_millis(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_reset() {
        let mut backoff = Backoff::new(10, 1000);
        backoff.wait().await;
        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_millis(10));
    }

    #[test]
    fn test_fault_reporter_invokes_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = FaultReporter::new(move |error| {
            sink.lock().unwrap().push(error.to_string());
        });

        reporter.report(&TrawlerError::Timeout {
            url: "https://example.test/slow".to_string(),
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
