//! Microdata extraction scraper
//!
//! Walks `itemscope`/`itemprop` annotations in the claimed page and persists
//! each item as a canonical JSON document. Documents are content-addressed by
//! digest, so the same item seen on many pages is stored once.

use crate::scrape::Scraper;
use crate::storage::{MicrodataDocument, Store};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use url::Url;

/// Extracts microdata items into the structured-data collection
pub struct MicrodataScraper<S: Store> {
    store: Arc<Mutex<S>>,
}

impl<S: Store> MicrodataScraper<S> {
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }
}

impl<S: Store> Scraper for MicrodataScraper<S> {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn extract_from(&mut self, url: &Url, html: &str) -> crate::Result<String> {
        let documents = extract_items(url, html);
        if !documents.is_empty() {
            let result = self.store.lock().unwrap().upsert_microdata(&documents);
            if let Err(e) = result {
                tracing::warn!(
                    "Dropped a batch of {} microdata documents: {}",
                    documents.len(),
                    e
                );
            }
        }
        Ok(format!("microdata items: {}", documents.len()))
    }
}

/// Extracts all top-level microdata items from an HTML page
pub fn extract_items(url: &Url, html: &str) -> Vec<MicrodataDocument> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("[itemscope]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(is_top_level)
        .map(|scope| build_document(url, scope))
        .collect()
}

/// Nested itemscopes belong to their parent item, not the page
fn is_top_level(element: &ElementRef) -> bool {
    !element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().attr("itemscope").is_some())
}

fn build_document(url: &Url, scope: ElementRef) -> MicrodataDocument {
    let item_type = scope.value().attr("itemtype").map(str::trim);

    let mut root = Map::new();
    if let Some(t) = item_type {
        root.insert("type".to_string(), Value::String(t.to_string()));
    }
    root.insert("properties".to_string(), Value::Object(item_properties(scope)));

    // serde_json writes object keys sorted, so equal items serialize
    // identically regardless of page markup order
    let document = Value::Object(root).to_string();
    let digest = hex::encode(Sha256::digest(document.as_bytes()));

    MicrodataDocument {
        digest,
        url: url.as_str().to_string(),
        item_type: item_type.map(short_type_name),
        document,
    }
}

/// Reduces a full itemtype URL to its trailing name, e.g. `Product`
fn short_type_name(itemtype: &str) -> String {
    itemtype
        .trim_end_matches('/')
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(itemtype)
        .to_string()
}

fn item_properties(scope: ElementRef) -> Map<String, Value> {
    let mut properties = Map::new();
    for node in scope.children() {
        if let Some(child) = ElementRef::wrap(node) {
            collect_properties(child, &mut properties);
        }
    }
    properties
}

/// Walks the subtree below an itemscope, collecting its itemprop values
///
/// A child carrying its own itemscope closes this item's property scope: with
/// an itemprop it contributes a nested object, without one it is an
/// independent item and is ignored here.
fn collect_properties(element: ElementRef, properties: &mut Map<String, Value>) {
    let prop_name = element.value().attr("itemprop").map(str::trim);
    let is_scope = element.value().attr("itemscope").is_some();

    match (prop_name, is_scope) {
        (Some(name), true) => {
            insert_property(properties, name, Value::Object(item_properties(element)));
            return;
        }
        (Some(name), false) => {
            insert_property(properties, name, Value::String(property_value(element)));
        }
        (None, true) => return,
        (None, false) => {}
    }

    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            collect_properties(child, properties);
        }
    }
}

/// Repeated property names accumulate into an array
fn insert_property(properties: &mut Map<String, Value>, name: &str, value: Value) {
    match properties.get_mut(name) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            properties.insert(name.to_string(), value);
        }
    }
}

/// The value of an itemprop element depends on its tag, per the microdata
/// processing rules
fn property_value(element: ElementRef) -> String {
    let attr = |name: &str| element.value().attr(name).map(str::trim);

    let value = match element.value().name() {
        "meta" => attr("content"),
        "a" | "area" | "link" => attr("href"),
        "img" | "audio" | "video" | "source" | "embed" | "iframe" | "track" => attr("src"),
        "object" => attr("data"),
        "data" | "meter" => attr("value"),
        "time" => attr("datetime"),
        _ => None,
    };

    match value {
        Some(v) => v.to_string(),
        None => squash_whitespace(&element.text().collect::<String>()),
    }
}

fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.test/product").unwrap()
    }

    #[test]
    fn test_extracts_typed_item_with_properties() {
        let html = r#"<html><body>
            <div itemscope itemtype="https://schema.org/Product">
                <span itemprop="name">Widget</span>
                <meta itemprop="sku" content="W-42">
            </div>
        </body></html>"#;

        let items = extract_items(&page_url(), html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type.as_deref(), Some("Product"));

        let doc: Value = serde_json::from_str(&items[0].document).unwrap();
        assert_eq!(doc["type"], "https://schema.org/Product");
        assert_eq!(doc["properties"]["name"], "Widget");
        assert_eq!(doc["properties"]["sku"], "W-42");
    }

    #[test]
    fn test_nested_itemscope_becomes_nested_object() {
        let html = r#"<div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">Widget</span>
            <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                <span itemprop="price">9.95</span>
            </div>
        </div>"#;

        let items = extract_items(&page_url(), html);
        assert_eq!(items.len(), 1);

        let doc: Value = serde_json::from_str(&items[0].document).unwrap();
        assert_eq!(doc["properties"]["offers"]["price"], "9.95");
    }

    #[test]
    fn test_repeated_property_accumulates() {
        let html = r#"<div itemscope>
            <span itemprop="keyword">one</span>
            <span itemprop="keyword">two</span>
        </div>"#;

        let items = extract_items(&page_url(), html);
        let doc: Value = serde_json::from_str(&items[0].document).unwrap();
        assert_eq!(doc["properties"]["keyword"], serde_json::json!(["one", "two"]));
    }

    #[test]
    fn test_link_and_image_properties_use_attributes() {
        let html = r#"<div itemscope>
            <a itemprop="url" href="/widget">Widget page</a>
            <img itemprop="image" src="/widget.png">
        </div>"#;

        let items = extract_items(&page_url(), html);
        let doc: Value = serde_json::from_str(&items[0].document).unwrap();
        assert_eq!(doc["properties"]["url"], "/widget");
        assert_eq!(doc["properties"]["image"], "/widget.png");
    }

    #[test]
    fn test_text_values_squash_whitespace() {
        let html = "<div itemscope><span itemprop=\"name\">  Widget \n  Deluxe </span></div>";
        let items = extract_items(&page_url(), html);
        let doc: Value = serde_json::from_str(&items[0].document).unwrap();
        assert_eq!(doc["properties"]["name"], "Widget Deluxe");
    }

    #[test]
    fn test_untyped_item_has_no_item_type() {
        let html = r#"<div itemscope><span itemprop="name">Widget</span></div>"#;
        let items = extract_items(&page_url(), html);
        assert_eq!(items[0].item_type, None);
    }

    #[test]
    fn test_identical_items_share_a_digest() {
        let html = r#"<div itemscope><span itemprop="name">Widget</span></div>"#;
        let a = extract_items(&Url::parse("https://a.test/1").unwrap(), html);
        let b = extract_items(&Url::parse("https://b.test/2").unwrap(), html);
        assert_eq!(a[0].digest, b[0].digest);
        assert_ne!(a[0].url, b[0].url);
    }

    #[test]
    fn test_page_without_microdata_yields_nothing() {
        let html = "<html><body><p>plain page</p></body></html>";
        assert!(extract_items(&page_url(), html).is_empty());
    }

    #[test]
    fn test_short_type_name_variants() {
        assert_eq!(short_type_name("https://schema.org/Product"), "Product");
        assert_eq!(short_type_name("https://schema.org/Product/"), "Product");
        assert_eq!(short_type_name("https://example.test/vocab#Thing"), "Thing");
        assert_eq!(short_type_name("Thing"), "Thing");
    }
}
