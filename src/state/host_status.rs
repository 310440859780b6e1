/// Host status definitions
///
/// A host record tracks one authority (URL origin) across the whole crawl.
/// Only `Ok` hosts are crawl-eligible.
use std::fmt;

/// Represents the current status of a host in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStatus {
    /// Host may be crawled
    Ok,

    /// Host refused crawling (robots or HTTP-level block)
    Blocked,

    /// Host was administratively excluded
    Excluded,

    /// Host metadata could not be refreshed
    Error,

    /// The frontier exhausted this host's URL backlog
    Done,
}

impl HostStatus {
    /// Returns true if URLs for this host may be handed out
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Blocked => "blocked",
            Self::Excluded => "excluded",
            Self::Error => "error",
            Self::Done => "done",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "blocked" => Some(Self::Blocked),
            "excluded" => Some(Self::Excluded),
            "error" => Some(Self::Error),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_crawlable() {
        assert!(HostStatus::Ok.is_crawlable());

        assert!(!HostStatus::Blocked.is_crawlable());
        assert!(!HostStatus::Excluded.is_crawlable());
        assert!(!HostStatus::Error.is_crawlable());
        assert!(!HostStatus::Done.is_crawlable());
    }

    #[test]
    fn test_roundtrip_db_string() {
        for status in [
            HostStatus::Ok,
            HostStatus::Blocked,
            HostStatus::Excluded,
            HostStatus::Error,
            HostStatus::Done,
        ] {
            let db_str = status.to_db_string();
            assert_eq!(Some(status), HostStatus::from_db_string(db_str));
        }
    }

    #[test]
    fn test_from_db_string_invalid() {
        assert_eq!(HostStatus::from_db_string("invalid"), None);
        assert_eq!(HostStatus::from_db_string(""), None);
    }
}
