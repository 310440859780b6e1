//! Robots.txt evaluation
//!
//! Thin fail-open wrapper around the `robotstxt` matcher. Hosts whose
//! robots.txt is missing, unfetched, or empty allow everything.

mod parser;

pub use parser::ParsedRobots;
