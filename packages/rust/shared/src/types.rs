//! Core domain types for the medicines catalog.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// ItemLink
// ---------------------------------------------------------------------------

/// One catalog entry discovered on the index page. Unique by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLink {
    /// Display name from the anchor text, if any anchor supplied one.
    pub name: Option<String>,
    /// Absolute URL with the fragment stripped.
    #[serde(rename = "canonicalUrl")]
    pub url: Url,
}

impl ItemLink {
    /// Name used in logs and failure lists; falls back to the URL.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.url.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The seven fixed sub-section pages every item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    About,
    Eligibility,
    HowAndWhen,
    SideEffects,
    Pregnancy,
    Interactions,
    CommonQuestions,
}

impl SectionKey {
    /// All keys in item order.
    pub const ALL: [SectionKey; 7] = [
        SectionKey::About,
        SectionKey::Eligibility,
        SectionKey::HowAndWhen,
        SectionKey::SideEffects,
        SectionKey::Pregnancy,
        SectionKey::Interactions,
        SectionKey::CommonQuestions,
    ];

    /// Symbolic name as it appears in the result document.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::About => "about",
            SectionKey::Eligibility => "eligibility",
            SectionKey::HowAndWhen => "howAndWhen",
            SectionKey::SideEffects => "sideEffects",
            SectionKey::Pregnancy => "pregnancy",
            SectionKey::Interactions => "interactions",
            SectionKey::CommonQuestions => "commonQuestions",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved sub-section links of one item. Absent key = not found on the page.
pub type SectionLinkMap = BTreeMap<SectionKey, Url>;

/// A (title, body) pair extracted under one heading or disclosure widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParagraph {
    pub title: String,
    pub body: String,
}

/// One named sub-topic page of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSection {
    pub paragraphs: Vec<ContentParagraph>,
    pub source_url: Option<String>,
}

impl ItemSection {
    /// A section whose link was found; paragraphs are filled in later.
    pub fn linked(url: &Url) -> Self {
        Self {
            paragraphs: Vec::new(),
            source_url: Some(url.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One scraped medicine with all seven section slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub canonical_url: String,
    pub captured_at: DateTime<Utc>,
    pub other_brand_names: Option<String>,
    pub summary: Option<String>,
    pub about: ItemSection,
    pub eligibility: ItemSection,
    pub how_and_when: ItemSection,
    pub side_effects: ItemSection,
    pub pregnancy: ItemSection,
    pub interactions: ItemSection,
    pub common_questions: ItemSection,
    pub related_tags: BTreeSet<String>,
}

impl Item {
    /// An empty shell for an admitted item.
    pub fn new(name: impl Into<String>, canonical_url: &Url, captured_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            canonical_url: canonical_url.to_string(),
            captured_at,
            other_brand_names: None,
            summary: None,
            about: ItemSection::default(),
            eligibility: ItemSection::default(),
            how_and_when: ItemSection::default(),
            side_effects: ItemSection::default(),
            pregnancy: ItemSection::default(),
            interactions: ItemSection::default(),
            common_questions: ItemSection::default(),
            related_tags: BTreeSet::new(),
        }
    }

    pub fn section(&self, key: SectionKey) -> &ItemSection {
        match key {
            SectionKey::About => &self.about,
            SectionKey::Eligibility => &self.eligibility,
            SectionKey::HowAndWhen => &self.how_and_when,
            SectionKey::SideEffects => &self.side_effects,
            SectionKey::Pregnancy => &self.pregnancy,
            SectionKey::Interactions => &self.interactions,
            SectionKey::CommonQuestions => &self.common_questions,
        }
    }

    pub fn section_mut(&mut self, key: SectionKey) -> &mut ItemSection {
        match key {
            SectionKey::About => &mut self.about,
            SectionKey::Eligibility => &mut self.eligibility,
            SectionKey::HowAndWhen => &mut self.how_and_when,
            SectionKey::SideEffects => &mut self.side_effects,
            SectionKey::Pregnancy => &mut self.pregnancy,
            SectionKey::Interactions => &mut self.interactions,
            SectionKey::CommonQuestions => &mut self.common_questions,
        }
    }
}

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// The result document of one run.
///
/// `succeeded + failed_names.len()` equals the number of items attempted,
/// which is at most `total_found` when a processing cap is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub total_found: usize,
    pub succeeded: usize,
    pub failed_names: Vec<String>,
    pub items: Vec<Item>,
    pub completed_at: DateTime<Utc>,
}

impl RunResult {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn item_serializes_all_seven_sections() {
        let item = Item::new("Aspirin", &url("https://example.com/medicines/aspirin/"), Utc::now());
        let json = serde_json::to_value(&item).expect("serialize");

        for key in SectionKey::ALL {
            let section = &json[key.as_str()];
            assert!(section.is_object(), "missing section {key}");
            assert_eq!(section["paragraphs"], serde_json::json!([]));
            assert!(section["sourceUrl"].is_null());
        }
        assert_eq!(json["canonicalUrl"], "https://example.com/medicines/aspirin/");
        assert!(json["capturedAt"].is_string());
        assert!(json["relatedTags"].is_array());
    }

    #[test]
    fn section_key_serde_names_match_as_str() {
        for key in SectionKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn section_mut_targets_named_slot() {
        let mut item = Item::new("Aciclovir", &url("https://example.com/medicines/aciclovir/"), Utc::now());
        let link = url("https://example.com/medicines/aciclovir/side-effects-of-aciclovir/");
        *item.section_mut(SectionKey::SideEffects) = ItemSection::linked(&link);

        assert_eq!(
            item.side_effects.source_url.as_deref(),
            Some("https://example.com/medicines/aciclovir/side-effects-of-aciclovir/")
        );
        assert!(item.section(SectionKey::About).source_url.is_none());
    }

    #[test]
    fn item_link_label_falls_back_to_url() {
        let named = ItemLink {
            name: Some("Ibuprofen".into()),
            url: url("https://example.com/medicines/ibuprofen/"),
        };
        let unnamed = ItemLink {
            name: None,
            url: url("https://example.com/medicines/ibuprofen/"),
        };
        assert_eq!(named.label(), "Ibuprofen");
        assert_eq!(unnamed.label(), "https://example.com/medicines/ibuprofen/");
    }

    #[test]
    fn run_result_roundtrip() {
        let result = RunResult {
            total_found: 3,
            succeeded: 1,
            failed_names: vec!["Codeine".into()],
            items: vec![Item::new("Aspirin", &url("https://example.com/medicines/aspirin/"), Utc::now())],
            completed_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&result).expect("serialize");
        assert!(json.contains("\"totalFound\": 3"));
        assert!(json.contains("\"failedNames\""));

        let parsed: RunResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.attempted(), 2);
        assert_eq!(parsed.items[0].name, "Aspirin");
    }
}
