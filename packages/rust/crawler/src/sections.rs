//! (title, body) extraction from leaflet section pages.
//!
//! Two layouts occur: prose pages where each `h2`–`h6` heading owns the
//! sibling elements up to the next heading (the `h1` is the page title), and question pages built from
//! `<details>` disclosure widgets. Bodies come back raw (flat text); repair
//! is the caller's job.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use leafdex_provider::dom;
use leafdex_shared::ContentParagraph;

/// Heading text must be longer than this.
const MIN_HEADING_LEN: usize = 3;
/// Fragments at or below this length are spacing/decoration.
const MIN_FRAGMENT_LEN: usize = 10;
/// Accumulated bodies at or below this length are dropped.
const MIN_BODY_LEN: usize = 20;
const MIN_PROMPT_LEN: usize = 5;
const MIN_ANSWER_LEN: usize = 10;

/// Headings that label page furniture rather than content. Lowercase substrings.
const HEADING_DENYLIST: &[&str] = &[
    "page last reviewed",
    "next review due",
    "support",
    "cookie",
    "more in ",
    "feedback",
    "survey",
    "help us improve",
    "navigation",
];

static MAIN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("valid selector"));
static ARTICLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("valid selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, h5, h6").expect("valid selector"));
static DETAILS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("details").expect("valid selector"));
static SUMMARY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("summary").expect("valid selector"));

/// Which layout a section page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    HeadingWalk,
    QuestionAnswer,
}

/// Extract raw pairs from `doc` in the given mode, in document order.
pub fn extract_sections(doc: &Html, mode: ExtractionMode) -> Vec<ContentParagraph> {
    let scope = content_scope(doc);
    match mode {
        ExtractionMode::HeadingWalk => heading_walk(scope),
        ExtractionMode::QuestionAnswer => question_answer(scope),
    }
}

/// The main content region, falling back to `article`, then `body`, then the root.
pub(crate) fn content_scope(doc: &Html) -> ElementRef<'_> {
    dom::select_first(doc, &[&*MAIN_SEL, &*ARTICLE_SEL, &*BODY_SEL]).unwrap_or(doc.root_element())
}

// ---------------------------------------------------------------------------
// Heading walk
// ---------------------------------------------------------------------------

fn heading_walk(scope: ElementRef<'_>) -> Vec<ContentParagraph> {
    let mut pairs = Vec::new();

    for heading in dom::select_all(scope, &HEADING_SEL) {
        let title = dom::normalized_text(heading);
        if !is_content_heading(&title) {
            continue;
        }

        let fragments: Vec<String> = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|sibling| !starts_new_section(*sibling))
            .map(|sibling| dom::text_of(sibling).trim().to_string())
            .filter(|text| text.chars().count() > MIN_FRAGMENT_LEN)
            .collect();

        let body = fragments.join(" ");
        if body.trim().chars().count() > MIN_BODY_LEN {
            pairs.push(ContentParagraph { title, body });
        }
    }

    pairs
}

fn is_content_heading(title: &str) -> bool {
    if title.chars().count() <= MIN_HEADING_LEN {
        return false;
    }
    let lower = title.to_lowercase();
    !HEADING_DENYLIST.iter().any(|deny| lower.contains(deny))
}

/// A heading, or a wrapper holding one, ends the current section.
fn starts_new_section(el: ElementRef<'_>) -> bool {
    dom::is_heading(el) || el.select(&HEADING_SEL).next().is_some()
}

// ---------------------------------------------------------------------------
// Question / answer
// ---------------------------------------------------------------------------

fn question_answer(scope: ElementRef<'_>) -> Vec<ContentParagraph> {
    let mut pairs = Vec::new();

    for details in dom::select_all(scope, &DETAILS_SEL) {
        let Some(summary) = details.select(&SUMMARY_SEL).next() else {
            continue;
        };
        let title = dom::normalized_text(summary);

        let body: String = details
            .children()
            .filter(|child| child.id() != summary.id())
            .map(|child| match ElementRef::wrap(child) {
                Some(el) => dom::text_of(el),
                None => child
                    .value()
                    .as_text()
                    .map(|t| String::from(&**t))
                    .unwrap_or_default(),
            })
            .collect();
        let body = body.trim().to_string();

        if title.chars().count() > MIN_PROMPT_LEN && body.chars().count() > MIN_ANSWER_LEN {
            pairs.push(ContentParagraph { title, body });
        }
    }

    pairs
}
