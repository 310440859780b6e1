/// URL record status definitions and the fetch/scrape state machine
///
/// A URL record advances `New -> Fetching -> Fetched -> Scraping -> Scraped`;
/// any pre-Fetched state can jump directly to `Blocked` when robots.txt
/// disallows the URL. `Scraped` and `Blocked` are terminal.
use std::fmt;

/// Represents the current status of a URL record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    /// Discovered, not yet handed to a fetcher. Stored as SQL NULL.
    New,

    /// Handed out by the frontier, awaiting page content
    Fetching,

    /// Page content stored, awaiting a scraper
    Fetched,

    /// Claimed by a scraper process
    Scraping,

    /// Extraction complete, content discarded (terminal)
    Scraped,

    /// Disallowed by robots.txt (terminal)
    Blocked,
}

impl UrlStatus {
    /// Returns true if no further processing will happen for this record
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scraped | Self::Blocked)
    }

    /// Returns true if stored page content may be present for this status
    pub fn carries_content(&self) -> bool {
        matches!(self, Self::Fetched | Self::Scraping)
    }

    /// Returns true if `self -> to` is a legal transition
    ///
    /// The happy path is strictly sequential; `Blocked` is reachable from any
    /// state that precedes `Fetched`. The crash-recovery resets
    /// (`Fetching -> New`, `Scraping -> Fetched`) are also legal.
    pub fn can_transition(&self, to: UrlStatus) -> bool {
        match (self, to) {
            (Self::New, Self::Fetching) => true,
            (Self::Fetching, Self::Fetched) => true,
            (Self::Fetched, Self::Scraping) => true,
            (Self::Scraping, Self::Scraped) => true,
            (Self::New | Self::Fetching, Self::Blocked) => true,
            // recovery sweeps
            (Self::Fetching, Self::New) => true,
            (Self::Scraping, Self::Fetched) => true,
            _ => false,
        }
    }

    /// Converts the status to its database representation
    ///
    /// `New` is stored as NULL, matching the store queries that select
    /// records with no status set.
    pub fn to_db_string(&self) -> Option<&'static str> {
        match self {
            Self::New => None,
            Self::Fetching => Some("fetching"),
            Self::Fetched => Some("fetched"),
            Self::Scraping => Some("scraping"),
            Self::Scraped => Some("scraped"),
            Self::Blocked => Some("blocked"),
        }
    }

    /// Parses a status from its database representation
    pub fn from_db_string(s: Option<&str>) -> Option<Self> {
        match s {
            None => Some(Self::New),
            Some("fetching") => Some(Self::Fetching),
            Some("fetched") => Some(Self::Fetched),
            Some("scraping") => Some(Self::Scraping),
            Some("scraped") => Some(Self::Scraped),
            Some("blocked") => Some(Self::Blocked),
            Some(_) => None,
        }
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string().unwrap_or("new"))
    }
}
