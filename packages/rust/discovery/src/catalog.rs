//! Catalog link extraction from the index page.
//!
//! Every anchor is a candidate. It must resolve onto the index host with a
//! path that continues past the catalog path (`/medicines/` alone, or
//! `/medicines/#B`, is the index itself). Entries are unique by canonical URL
//! and keep first-encounter order. An image-only anchor opens an entry that a
//! later named anchor for the same URL fills in; entries that never get an
//! accepted name are dropped.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use leafdex_provider::dom;
use leafdex_shared::ItemLink;

/// Names at least this long are navigation text, not medicine names.
const MAX_NAME_LEN: usize = 100;

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Build the deduplicated catalog from a parsed index page.
pub fn build_catalog(doc: &Html, base_url: &Url, catalog_path: &str) -> Vec<ItemLink> {
    let mut links: Vec<ItemLink> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for anchor in doc.select(&ANCHOR_SEL) {
        let Some(mut url) = dom::resolve_href(anchor, base_url) else {
            continue;
        };
        if !is_item_url(&url, base_url, catalog_path) {
            continue;
        }
        url.set_fragment(None);

        let text = dom::normalized_text(anchor);
        let name = if text.is_empty() {
            None
        } else if is_acceptable_name(&text) {
            Some(text)
        } else {
            debug!(%url, name = %text, "rejected catalog anchor");
            continue;
        };

        match index.get(url.as_str()) {
            Some(&i) => {
                let existing = &mut links[i];
                if existing.name.is_none() && name.is_some() {
                    existing.name = name;
                }
            }
            None => {
                index.insert(url.to_string(), links.len());
                links.push(ItemLink { name, url });
            }
        }
    }

    let before = links.len();
    links.retain(|link| link.name.is_some());
    if links.len() < before {
        debug!(dropped = before - links.len(), "dropped catalog entries without a name");
    }
    links
}

/// Whether `url` points at an item page below the catalog path.
fn is_item_url(url: &Url, base_url: &Url, catalog_path: &str) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    if url.host_str() != base_url.host_str() {
        return false;
    }

    let path = url.path();
    match path.find(catalog_path) {
        Some(pos) => {
            let tail = &path[pos + catalog_path.len()..];
            !tail.trim_matches('/').is_empty()
        }
        None => false,
    }
}

/// Filters generic labels, overview headers, and cross-references.
fn is_acceptable_name(name: &str) -> bool {
    let len = name.chars().count();
    if len <= 1 || len >= MAX_NAME_LEN {
        return false;
    }
    if name.eq_ignore_ascii_case("index") || name.contains("Overview -") {
        return false;
    }
    !name.to_lowercase().contains("see ")
}
