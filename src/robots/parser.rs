//! Robots.txt wrapper around the robotstxt crate

use robotstxt::DefaultMatcher;

/// Robots.txt rules for one host
///
/// Built from the robots content persisted on the host record. A host whose
/// robots.txt was never fetched, came back missing, or is empty gets a
/// permissive ruleset; a crawl should never stall on an absent robots file.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates rules from the robots content stored for a host
    ///
    /// `None` means the refresh path has not fetched (or could not fetch)
    /// robots.txt, which evaluates the same as an empty file.
    pub fn from_stored(content: Option<&str>) -> Self {
        Self {
            content: content.unwrap_or_default().to_string(),
        }
    }

    /// Creates a permissive ruleset that allows everything
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks whether the given URL is allowed for the user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfetched_robots_allows_all() {
        let robots = ParsedRobots::from_stored(None);
        assert!(robots.is_allowed("https://example.test/any/path", "Trawler/1.0"));
    }

    #[test]
    fn test_empty_robots_allows_all() {
        let robots = ParsedRobots::from_stored(Some("   \n"));
        assert!(robots.is_allowed("https://example.test/admin", "Trawler/1.0"));
    }

    #[test]
    fn test_disallow_all() {
        let robots = ParsedRobots::from_stored(Some("User-agent: *\nDisallow: /"));
        assert!(!robots.is_allowed("https://example.test/", "Trawler/1.0"));
        assert!(!robots.is_allowed("https://example.test/page", "Trawler/1.0"));
    }

    #[test]
    fn test_disallow_specific_path() {
        let robots = ParsedRobots::from_stored(Some("User-agent: *\nDisallow: /private"));
        assert!(robots.is_allowed("https://example.test/page", "Trawler/1.0"));
        assert!(!robots.is_allowed("https://example.test/private", "Trawler/1.0"));
        assert!(!robots.is_allowed("https://example.test/private/x", "Trawler/1.0"));
    }

    #[test]
    fn test_specific_user_agent_group() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_stored(Some(content));
        assert!(robots.is_allowed("https://example.test/page", "Trawler/1.0"));
        assert!(!robots.is_allowed("https://example.test/page", "BadBot"));
    }

    #[test]
    fn test_garbage_robots_fails_open() {
        let robots = ParsedRobots::from_stored(Some("not a robots file {{{"));
        assert!(robots.is_allowed("https://example.test/any", "Trawler/1.0"));
    }

    #[test]
    fn test_allow_all_constructor() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("https://example.test/admin", "Trawler/1.0"));
    }
}
