//! URL frontier
//!
//! The frontier is the heart of the scheduler: it decides which URL is
//! fetched next, spreading consecutive fetches across hosts and enforcing
//! the crawl-delay budget through a rotating host cache. It also carries the
//! page pipeline: fetched bodies in, claimed pages out, discovered links
//! back in.

mod compress;
mod rotation;
mod url_frontier;

pub use compress::{compress, decompress};
pub use rotation::HostRotation;
pub use url_frontier::{Page, UrlFrontier};
