//! Query helpers over a parsed [`scraper::Html`] snapshot.
//!
//! These are the query / queryAll / text / attribute operations every
//! extractor uses, so text flattening and whitespace rules stay identical
//! across call sites.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use leafdex_shared::{LeafdexError, Result};

/// Compile a CSS selector supplied at runtime (config, consent matchers).
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| LeafdexError::parse(format!("invalid selector '{css}': {e}")))
}

/// All elements under `scope` matching `selector`, in document order.
pub fn select_all<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// First element in the document matching any of `selectors`, tried in order.
pub fn select_first<'a>(doc: &'a Html, selectors: &[&Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|sel| doc.select(sel).next())
}

/// Flat text content: every descendant text node concatenated with no separators.
///
/// Block boundaries are lost here (`<li>a</li><li>b</li>` → `"ab"`); repair
/// happens downstream in the text reconstruction pipeline.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Flat text with whitespace runs collapsed and trimmed.
pub fn normalized_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&text_of(el))
}

/// Text of the element's direct text children only (skips nested elements).
pub fn own_text(el: ElementRef<'_>) -> String {
    let raw: String = el
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    collapse_whitespace(&raw)
}

/// Attribute value, if present.
pub fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(str::to_string)
}

/// Resolve an anchor's `href` against `base`. Skips `javascript:` and `mailto:`.
pub fn resolve_href(el: ElementRef<'_>, base: &Url) -> Option<Url> {
    let href = el.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    base.join(href).ok()
}

/// Collapse every whitespace run (including NBSP) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `el` is a heading element (`h1`–`h6`).
pub fn is_heading(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Remove every node matching `selector` and re-serialize.
/// Returns `None` when nothing matched.
pub fn remove_matching(html: &str, selector: &Selector) -> Option<String> {
    let mut doc = Html::parse_document(html);
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    if ids.is_empty() {
        return None;
    }

    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    Some(doc.html())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn text_of_loses_block_boundaries() {
        let d = doc("<ul><li>cold sores</li><li>genital herpes</li></ul>");
        let ul = d.select(&selector("ul").unwrap()).next().unwrap();
        assert_eq!(text_of(ul), "cold soresgenital herpes");
    }

    #[test]
    fn normalized_text_collapses_whitespace() {
        let d = doc("<p>  Take \n\n with\u{a0}food  </p>");
        let p = d.select(&selector("p").unwrap()).next().unwrap();
        assert_eq!(normalized_text(p), "Take with food");
    }

    #[test]
    fn own_text_skips_children() {
        let d = doc(r#"<h1>Aciclovir <span>Brand names: Zovirax</span></h1>"#);
        let h1 = d.select(&selector("h1").unwrap()).next().unwrap();
        assert_eq!(own_text(h1), "Aciclovir");
        assert_eq!(normalized_text(h1), "Aciclovir Brand names: Zovirax");
    }

    #[test]
    fn resolve_href_handles_relative_and_skips_schemes() {
        let d = doc(r#"<a href="../aspirin/">a</a><a href="mailto:x@y.z">m</a><a href="javascript:void(0)">j</a>"#);
        let base = Url::parse("https://example.com/medicines/index/").unwrap();
        let links: Vec<_> = d
            .select(&selector("a").unwrap())
            .filter_map(|a| resolve_href(a, &base))
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/medicines/aspirin/");
    }

    #[test]
    fn select_first_respects_priority() {
        let d = doc("<article><p>article</p></article><main><p>main</p></main>");
        let main = selector("main").unwrap();
        let article = selector("article").unwrap();
        let hit = select_first(&d, &[&main, &article]).unwrap();
        assert_eq!(hit.value().name(), "main");
    }

    #[test]
    fn remove_matching_detaches_nodes() {
        let html = r#"<html><body><div class="cookie-banner">Accept?</div><p>Keep</p></body></html>"#;
        let out = remove_matching(html, &selector(".cookie-banner").unwrap()).unwrap();
        assert!(!out.contains("Accept?"));
        assert!(out.contains("Keep"));
        assert!(remove_matching(&out, &selector(".cookie-banner").unwrap()).is_none());
    }

    #[test]
    fn invalid_selector_is_parse_error() {
        let err = selector("a[").unwrap_err();
        assert!(err.to_string().contains("invalid selector"));
    }
}
