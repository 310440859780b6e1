//! Host registry
//!
//! Tracks the crawlable hosts and serves two consumers: the frontier, which
//! dequeues hosts for polite crawling, and the refresh driver, which keeps
//! each host's robots.txt and status current.

mod registry;

pub use registry::HostRegistry;
