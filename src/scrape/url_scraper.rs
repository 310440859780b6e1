//! Link harvesting scraper

use crate::filter::LinkFilter;
use crate::frontier::UrlFrontier;
use crate::scrape::Scraper;
use crate::storage::Store;
use scraper::{Html, Selector};
use std::sync::{Arc, Mutex};
use url::Url;

/// Harvests outgoing links and feeds accepted ones back into the frontier
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - Relative hrefs, resolved against `<base href>` when present, the page
///   URL otherwise
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:`, `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything the configured link filter rejects
pub struct UrlScraper<S: Store> {
    frontier: Arc<Mutex<UrlFrontier<S>>>,
    filter: LinkFilter,
}

impl<S: Store> UrlScraper<S> {
    pub fn new(frontier: Arc<Mutex<UrlFrontier<S>>>, filter: LinkFilter) -> Self {
        Self { frontier, filter }
    }

    fn harvest_links(&mut self, page_url: &Url, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        let base = resolve_base(&document, page_url);

        let mut links = Vec::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                let Some(link) = resolve_link(href, &base) else {
                    continue;
                };
                if self.filter.accepts(&link) && !links.contains(&link) {
                    links.push(link);
                }
            }
        }
        links
    }
}

impl<S: Store> Scraper for UrlScraper<S> {
    fn name(&self) -> &'static str {
        "urls"
    }

    fn extract_from(&mut self, url: &Url, html: &str) -> crate::Result<String> {
        let links = self.harvest_links(url, html);
        let found = links.len();
        let added = self.frontier.lock().unwrap().add_urls(&links)?;
        Ok(format!("urls: {}, new: {}", found, added))
    }
}

/// Resolves the document's effective base URL
///
/// A `<base href>` is itself resolved against the page URL, as browsers do.
fn resolve_base(document: &Html, page_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves one href to an absolute http(s) URL, or None to skip it
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
