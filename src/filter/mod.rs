//! Link acceptance filtering
//!
//! Decides which discovered links are worth scheduling at all, before they
//! ever reach the frontier. Three rule families apply: file extensions, URL
//! schemes, and domains. Extension and scheme rules treat the accept list as
//! an allowlist override; domain rules require an accept match and no reject
//! match.

mod domain;
mod link_filter;

pub use domain::domain_matches;
pub use link_filter::LinkFilter;
