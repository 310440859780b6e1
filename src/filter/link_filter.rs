//! Combined link filter with memoized domain verdicts

use crate::cache::BoundedMap;
use crate::config::types::{FilterConfig, RuleSet};
use crate::filter::domain::domain_matches;
use url::Url;

/// Applies extension, scheme, and domain rules to candidate links
///
/// Domain verdicts recur heavily within one crawl, so they are memoized in a
/// bounded per-hostname cache. Extension and scheme checks are cheap string
/// lookups and are not cached.
pub struct LinkFilter {
    config: FilterConfig,
    domain_verdicts: BoundedMap<String, bool>,
}

impl LinkFilter {
    pub fn new(config: FilterConfig) -> Self {
        let max_cache = config.max_domain_cache;
        Self {
            config,
            domain_verdicts: BoundedMap::new(max_cache),
        }
    }

    /// Returns true if the URL passes all three rule families
    pub fn accepts(&mut self, url: &Url) -> bool {
        if !allowed_by_rules(url.scheme(), &self.config.schemes) {
            return false;
        }

        if let Some(extension) = path_extension(url.path()) {
            if !allowed_by_rules(&extension, &self.config.extensions) {
                return false;
            }
        }

        let hostname = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return false,
        };
        self.domain_allowed(hostname)
    }

    fn domain_allowed(&mut self, hostname: String) -> bool {
        if let Some(verdict) = self.domain_verdicts.get(&hostname) {
            return *verdict;
        }

        let rules = &self.config.domains;
        let accepted = rules.accept.is_empty()
            || rules.accept.iter().any(|p| domain_matches(&hostname, p));
        let rejected = rules.reject.iter().any(|p| domain_matches(&hostname, p));
        let verdict = accepted && !rejected;

        self.domain_verdicts.insert(hostname, verdict);
        verdict
    }
}

/// Accept-list override semantics: listed in accept wins outright, listed in
/// reject loses, everything else passes.
fn allowed_by_rules(value: &str, rules: &RuleSet) -> bool {
    if rules.accept.iter().any(|a| a == value) {
        return true;
    }
    !rules.reject.iter().any(|r| r == value)
}

/// Extracts the lowercase file extension of the final path segment, if any
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let dot = segment.rfind('.')?;
    if dot == 0 || dot + 1 == segment.len() {
        return None;
    }
    Some(segment[dot + 1..].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(domains_accept: &[&str], domains_reject: &[&str]) -> LinkFilter {
        let mut config = FilterConfig::default();
        config.domains.accept = domains_accept.iter().map(|s| s.to_string()).collect();
        config.domains.reject = domains_reject.iter().map(|s| s.to_string()).collect();
        LinkFilter::new(config)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_reject_overrides_accept_for_domains() {
        let mut filter = filter_with(&[".nz"], &[".google."]);
        assert!(filter.accepts(&url("https://www.example.co.nz/page")));
        assert!(!filter.accepts(&url("https://www.google.co.nz/search")));
        assert!(!filter.accepts(&url("https://www.example.com/")));
    }

    #[test]
    fn test_empty_accept_list_admits_all_domains() {
        let mut filter = filter_with(&[], &[".ads."]);
        assert!(filter.accepts(&url("https://anything.example/")));
        assert!(!filter.accepts(&url("https://www.ads.example/")));
    }

    #[test]
    fn test_extension_reject_list() {
        let mut config = FilterConfig::default();
        config.extensions.reject = vec!["jpg".to_string(), "pdf".to_string()];
        let mut filter = LinkFilter::new(config);

        assert!(!filter.accepts(&url("https://example.test/photo.JPG")));
        assert!(!filter.accepts(&url("https://example.test/doc.pdf")));
        assert!(filter.accepts(&url("https://example.test/page.html")));
    }

    #[test]
    fn test_no_extension_is_always_accepted() {
        let mut config = FilterConfig::default();
        config.extensions.reject = vec!["html".to_string()];
        let mut filter = LinkFilter::new(config);

        assert!(filter.accepts(&url("https://example.test/about")));
        assert!(filter.accepts(&url("https://example.test/")));
    }

    #[test]
    fn test_extension_accept_overrides_reject() {
        let mut config = FilterConfig::default();
        config.extensions.accept = vec!["html".to_string()];
        config.extensions.reject = vec!["html".to_string()];
        let mut filter = LinkFilter::new(config);

        assert!(filter.accepts(&url("https://example.test/page.html")));
    }

    #[test]
    fn test_scheme_rules() {
        let mut config = FilterConfig::default();
        config.schemes.reject = vec!["ftp".to_string()];
        let mut filter = LinkFilter::new(config);

        assert!(!filter.accepts(&url("ftp://example.test/file")));
        assert!(filter.accepts(&url("https://example.test/file")));
    }

    #[test]
    fn test_domain_verdict_is_memoized() {
        let mut filter = filter_with(&[".nz"], &[]);
        assert!(filter.accepts(&url("https://www.example.co.nz/a")));
        assert_eq!(filter.domain_verdicts.len(), 1);
        assert!(filter.accepts(&url("https://www.example.co.nz/b")));
        assert_eq!(filter.domain_verdicts.len(), 1);
    }

    #[test]
    fn test_dotfile_segment_has_no_extension() {
        assert_eq!(path_extension("/dir/.hidden"), None);
        assert_eq!(path_extension("/dir/file."), None);
        assert_eq!(path_extension("/dir/file.TXT"), Some("txt".to_string()));
        assert_eq!(path_extension("/dir.d/file"), None);
    }
}
