//! Per-item extraction: detail page basics, section link map, section pages.
//!
//! Stages run strictly in order inside one browsing context:
//!
//! - **A** detail page fetch and basics (name, brands, summary, tags).
//!   Any failure aborts the item with [`LeafdexError::ItemFetch`].
//! - **B** section link classification over the same snapshot. Never fails;
//!   an unrecognised page gives an empty map.
//! - **C** one fetch per linked section. A failure empties that section only
//!   and is reported back in [`ItemOutcome::section_failures`].

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use leafdex_provider::{BrowsingContext, DocumentProvider, RenderedPage, dismiss_consent, dom};
use leafdex_shared::{
    ContentParagraph, Item, ItemLink, ItemSection, LeafdexError, Result, RunConfig, SectionKey,
    SectionLinkMap,
};
use leafdex_text::TextPipeline;

use crate::sections::{ExtractionMode, content_scope, extract_sections};

/// Summary candidates must be longer than this.
const MIN_SUMMARY_LEN: usize = 50;
/// Related tags must be shorter than this.
const MAX_TAG_LEN: usize = 50;

/// Paragraphs that are page furniture, never a summary. Lowercase substrings.
const SUMMARY_DENYLIST: &[&str] = &["cookie", "analytics", "page last reviewed", "next review due"];

/// Case-insensitive label prefixes of the alternate brand names line.
const BRAND_PREFIXES: &[&str] = &["brand names:", "brand name:"];

/// Separators between the medicine name and an inline brand suffix in `h1`.
const NAME_SEPARATORS: &[&str] = &[" - ", "\u{2013}", "\u{2014}"];

/// Keyword groups for section links, in classification order. An anchor is
/// assigned to the first group it matches.
const SECTION_KEYWORDS: &[(SectionKey, &[&str])] = &[
    (SectionKey::CommonQuestions, &["common questions", "questions about", "faq"]),
    (SectionKey::SideEffects, &["side effects"]),
    (SectionKey::HowAndWhen, &["how and when", "how to take", "how to use", "when to take"]),
    (SectionKey::Eligibility, &["who can", "eligib"]),
    (SectionKey::Pregnancy, &["pregnan", "breastfeeding", "fertility"]),
    (SectionKey::Interactions, &["other medicines", "taking with", "interaction"]),
    (SectionKey::About, &["about"]),
];

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static H1_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static BRAND_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, span").expect("valid selector"));
static META_DESCRIPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

/// Site layout and navigation settings for item extraction.
#[derive(Debug, Clone)]
pub struct DetailOptions {
    /// Section links must live under this path.
    pub catalog_path: String,
    /// Related-topic links live under this path.
    pub related_path: String,
    pub timeout: Duration,
    pub consent_selectors: Vec<String>,
}

impl From<&RunConfig> for DetailOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            catalog_path: config.catalog_path.clone(),
            related_path: config.related_path.clone(),
            timeout: config.timeout,
            consent_selectors: config.consent_selectors.clone(),
        }
    }
}

/// A section that could not be fetched; its slot keeps the source URL.
#[derive(Debug)]
pub struct SectionFailure {
    pub key: SectionKey,
    pub error: LeafdexError,
}

/// A completed item plus the sections that degraded along the way.
#[derive(Debug)]
pub struct ItemOutcome {
    pub item: Item,
    pub section_failures: Vec<SectionFailure>,
}

/// Fields read from the detail page in stage A.
#[derive(Debug, Default)]
struct DetailBasics {
    name: Option<String>,
    other_brand_names: Option<String>,
    summary: Option<String>,
    related_tags: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// DetailExtractor
// ---------------------------------------------------------------------------

/// Runs the three extraction stages for one catalog entry at a time.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct DetailExtractor {
    provider: Arc<dyn DocumentProvider>,
    text: TextPipeline,
    options: DetailOptions,
}

impl DetailExtractor {
    pub fn new(provider: Arc<dyn DocumentProvider>, text: TextPipeline, options: DetailOptions) -> Self {
        Self {
            provider,
            text,
            options,
        }
    }

    /// Extract one item in a fresh browsing context.
    #[instrument(skip_all, fields(item = %link.label(), url = %link.url))]
    pub async fn extract(&self, link: &ItemLink) -> Result<ItemOutcome> {
        let item_fetch = |e: LeafdexError| LeafdexError::item_fetch(link.url.as_str(), e);

        let mut ctx = self.provider.new_context().await.map_err(item_fetch)?;

        // Stage A
        let mut page = ctx
            .navigate(&link.url, self.options.timeout)
            .await
            .map_err(item_fetch)?;
        dismiss_consent(ctx.as_mut(), &mut page, &self.options.consent_selectors).await;
        let captured_at = Utc::now();

        // Stage B reads the same snapshot.
        let (basics, section_links) = self.read_detail_page(&page, link);

        let name = basics
            .name
            .unwrap_or_else(|| link.label().to_string());
        let mut item = Item::new(name, &link.url, captured_at);
        item.other_brand_names = basics.other_brand_names;
        item.summary = basics.summary;
        item.related_tags = basics.related_tags;
        debug!(sections = section_links.len(), "detail page read");

        // Stage C
        let mut section_failures = Vec::new();
        for (&key, url) in &section_links {
            *item.section_mut(key) = ItemSection::linked(url);
            match self.fetch_section(ctx.as_mut(), key, url).await {
                Ok(paragraphs) => item.section_mut(key).paragraphs = paragraphs,
                Err(error) => {
                    warn!(section = %key, %url, error = %error, "section degraded");
                    section_failures.push(SectionFailure { key, error });
                }
            }
        }

        Ok(ItemOutcome {
            item,
            section_failures,
        })
    }

    fn read_detail_page(&self, page: &RenderedPage, link: &ItemLink) -> (DetailBasics, SectionLinkMap) {
        let doc = page.document();
        let basics = DetailBasics {
            name: primary_name(&doc),
            other_brand_names: brand_names(&doc),
            summary: summary(&doc),
            related_tags: related_tags(&doc, &page.url, &self.options.related_path),
        };
        let links = classify_section_links(&doc, &page.url, &link.url, &self.options.catalog_path);
        (basics, links)
    }

    async fn fetch_section(
        &self,
        ctx: &mut dyn BrowsingContext,
        key: SectionKey,
        url: &Url,
    ) -> Result<Vec<ContentParagraph>> {
        let mut page = ctx
            .navigate(url, self.options.timeout)
            .await
            .map_err(|e| LeafdexError::section_fetch(url.as_str(), e))?;
        dismiss_consent(ctx, &mut page, &self.options.consent_selectors).await;

        let mode = match key {
            SectionKey::CommonQuestions => ExtractionMode::QuestionAnswer,
            _ => ExtractionMode::HeadingWalk,
        };
        let raw = extract_sections(&page.document(), mode);

        Ok(raw
            .into_iter()
            .map(|p| ContentParagraph {
                body: self.text.repair(&p.body),
                title: p.title,
            })
            .filter(|p| !p.body.is_empty())
            .collect())
    }
}

impl std::fmt::Debug for DetailExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailExtractor")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Stage A helpers
// ---------------------------------------------------------------------------

/// `h1` text up to the first dash-like separator.
///
/// Prefers the heading's own text so a nested brand caption is ignored.
fn primary_name(doc: &Html) -> Option<String> {
    let h1 = doc.select(&H1_SEL).next()?;
    let mut text = dom::own_text(h1);
    if text.is_empty() {
        text = dom::normalized_text(h1);
    }
    let name = strip_brand_suffix(&text);
    (!name.is_empty()).then(|| name.to_string())
}

fn strip_brand_suffix(text: &str) -> &str {
    let cut = NAME_SEPARATORS
        .iter()
        .filter_map(|sep| text.find(sep))
        .min()
        .unwrap_or(text.len());
    text[..cut].trim()
}

fn brand_names(doc: &Html) -> Option<String> {
    content_scope(doc)
        .select(&BRAND_SEL)
        .find_map(|el| strip_brand_prefix(&dom::normalized_text(el)))
}

fn strip_brand_prefix(text: &str) -> Option<String> {
    BRAND_PREFIXES.iter().find_map(|prefix| {
        let head = text.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = text[prefix.len()..].trim();
        (!rest.is_empty()).then(|| rest.to_string())
    })
}

fn summary(doc: &Html) -> Option<String> {
    content_scope(doc)
        .select(&PARAGRAPH_SEL)
        .map(dom::normalized_text)
        .find(|text| is_summary_candidate(text))
        .or_else(|| meta_description(doc))
}

fn is_summary_candidate(text: &str) -> bool {
    if text.chars().count() <= MIN_SUMMARY_LEN {
        return false;
    }
    let lower = text.to_lowercase();
    !SUMMARY_DENYLIST.iter().any(|deny| lower.contains(deny))
}

fn meta_description(doc: &Html) -> Option<String> {
    let meta = doc.select(&META_DESCRIPTION_SEL).next()?;
    let content = dom::collapse_whitespace(&dom::attr(meta, "content")?);
    (!content.is_empty()).then_some(content)
}

fn related_tags(doc: &Html, base: &Url, related_path: &str) -> BTreeSet<String> {
    doc.select(&ANCHOR_SEL)
        .filter(|a| {
            dom::resolve_href(*a, base).is_some_and(|url| url.path().starts_with(related_path))
        })
        .map(dom::normalized_text)
        .filter(|text| {
            let len = text.chars().count();
            len > 0 && len < MAX_TAG_LEN
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stage B helpers
// ---------------------------------------------------------------------------

/// Classify on-site anchors into the seven section slots.
fn classify_section_links(doc: &Html, base: &Url, item_url: &Url, catalog_path: &str) -> SectionLinkMap {
    let mut map = SectionLinkMap::new();

    for anchor in doc.select(&ANCHOR_SEL) {
        let Some(url) = section_candidate(anchor, base, item_url, catalog_path) else {
            continue;
        };
        let haystack = format!("{} {}", dom::normalized_text(anchor), url.path())
            .to_lowercase()
            .replace(['-', '_', '/'], " ");

        let Some(key) = SECTION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
            .map(|(key, _)| *key)
        else {
            continue;
        };
        map.entry(key).or_insert(url);
    }

    map
}

/// On-site URL below the catalog path that is neither the index nor the item.
fn section_candidate(anchor: ElementRef<'_>, base: &Url, item_url: &Url, catalog_path: &str) -> Option<Url> {
    let mut url = dom::resolve_href(anchor, base)?;
    url.set_fragment(None);
    if url.host_str() != base.host_str() || !url.path().starts_with(catalog_path) {
        return None;
    }
    let path = url.path().trim_end_matches('/');
    if path.is_empty() || path == catalog_path.trim_end_matches('/') {
        return None;
    }
    if path == item_url.path().trim_end_matches('/') {
        return None;
    }
    Some(url)
}
