//! Bounded-concurrency item extraction.
//!
//! This crate provides:
//! - [`scheduler`] — FIFO permit gate, progress accounting, per-task delay
//! - [`sections`] — heading-walk and question/answer content extraction
//! - [`detail`] — the three-stage per-item extractor

pub mod detail;
pub mod scheduler;
pub mod sections;

pub use detail::{DetailExtractor, DetailOptions, ItemOutcome, SectionFailure};
pub use scheduler::{Permit, PermitGate, ProgressSnapshot, ProgressTracker, Scheduler};
pub use sections::{ExtractionMode, extract_sections};

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn load_fixture(name: &str) -> Html {
        let path = format!("../../../fixtures/html/{name}");
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("missing fixture: {path}"));
        Html::parse_document(&content)
    }

    #[test]
    fn about_fixture_yields_content_headings_only() {
        let doc = load_fixture("aciclovir_about.html");
        let pairs = extract_sections(&doc, ExtractionMode::HeadingWalk);
        let titles: Vec<_> = pairs.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["What aciclovir is used for", "Key facts", "Who it is for"]
        );
    }

    #[test]
    fn side_effects_fixture_keeps_document_order() {
        let doc = load_fixture("aciclovir_side_effects.html");
        let pairs = extract_sections(&doc, ExtractionMode::HeadingWalk);
        assert_eq!(pairs[0].title, "Common side effects");
        assert_eq!(pairs[1].title, "Serious side effects");
        assert!(pairs.iter().all(|p| p.body.chars().count() > 20));
    }

    #[test]
    fn questions_fixture_reads_disclosure_widgets() {
        let doc = load_fixture("aciclovir_common_questions.html");
        let pairs = extract_sections(&doc, ExtractionMode::QuestionAnswer);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].title, "How does aciclovir work?");
        assert_eq!(pairs[2].title, "Can I take it with ibuprofen?");
        assert_eq!(pairs[2].body, "Yes, this is usually safe.");
    }
}
