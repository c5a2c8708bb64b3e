//! Word list used to find lost word boundaries.
//!
//! Loaded once at startup from a newline-separated file (typically
//! `/usr/share/dict/words`). The built-in leaflet vocabulary is always merged
//! in, since general word lists lack compounds like "breastfeeding". When the
//! file is missing or empty the built-in vocabulary is used on its own, so
//! repair keeps running with lower recall.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use leafdex_shared::{LeafdexError, Result};

/// Fallback vocabulary: common words in medicine leaflets.
const BUILTIN_WORDS: &[&str] = &[
    "about", "after", "alcohol", "allergic", "allergy", "also", "always", "anxiety", "asthma",
    "before", "bleeding", "blood", "body", "bowel", "breastfeeding", "breathing", "can",
    "cannot", "capsules", "chest", "child", "children", "cold", "common", "condition",
    "conditions", "constipation", "cough", "cream", "daily", "diabetes", "diarrhoea",
    "dizziness", "dizzy", "doctor", "dose", "doses", "drink", "drowsy", "dry", "during",
    "each", "effects", "emergency", "every", "eye", "eyes", "feel", "feeling", "fever",
    "food", "genital", "headache", "headaches", "health", "heart", "help", "herpes", "high",
    "hospital", "how", "infection", "infections", "injection", "itching", "kidney", "kidneys",
    "liquid", "liver", "long", "medicine", "medicines", "missed", "more", "mouth", "muscle",
    "nausea", "nose", "often", "other", "overdose", "pain", "pharmacist", "pregnancy",
    "pregnant", "pressure", "problems", "rash", "rare", "risk", "serious", "severe",
    "shingles", "short", "side", "sick", "skin", "sleep", "sores", "speak", "stomach",
    "stop", "swelling", "symptoms", "tablet", "tablets", "take", "taking", "term", "that",
    "their", "these", "this", "throat", "tired", "treat", "treatment", "urgent", "usually",
    "vomiting", "water", "weeks", "what", "when", "which", "while", "with", "without",
    "women", "your",
];

/// Where a dictionary's words came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionarySource {
    File(PathBuf),
    Builtin,
    Inline,
}

/// A case-insensitive set of known words.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: HashSet<String>,
    source: DictionarySource,
}

impl Dictionary {
    /// The built-in fallback vocabulary.
    pub fn builtin() -> Self {
        let mut dict = Self::from_words(BUILTIN_WORDS.iter().copied());
        dict.source = DictionarySource::Builtin;
        dict
    }

    /// Build from an explicit word list. Non-alphabetic entries are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self {
            words: HashSet::new(),
            source: DictionarySource::Inline,
        };
        dict.add_words(words);
        dict
    }

    /// Add words to the set. Non-alphabetic entries are dropped.
    pub fn add_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(words.into_iter().filter_map(|w| {
            let w = w.as_ref().trim();
            (!w.is_empty() && w.chars().all(|c| c.is_ascii_alphabetic()))
                .then(|| w.to_ascii_lowercase())
        }));
    }

    /// Load a newline-separated word list.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LeafdexError::io(path, e))?;
        let mut dict = Self::from_words(content.lines());
        dict.source = DictionarySource::File(path.to_path_buf());
        Ok(dict)
    }

    /// Load `path` merged with the built-in vocabulary, falling back to
    /// [`Dictionary::builtin`] alone if the file is unusable.
    pub fn load_or_builtin(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(mut dict) if !dict.is_empty() => {
                dict.add_words(BUILTIN_WORDS);
                debug!(?path, words = dict.len(), "dictionary loaded");
                dict
            }
            Ok(_) => {
                warn!(?path, "dictionary file has no usable words, using built-in vocabulary");
                Self::builtin()
            }
            Err(e) => {
                warn!(error = %e, "dictionary unavailable, using built-in vocabulary");
                Self::builtin()
            }
        }
    }

    /// Case-insensitive membership.
    pub fn contains(&self, word: &str) -> bool {
        if word.bytes().all(|b| b.is_ascii_lowercase()) {
            self.words.contains(word)
        } else {
            self.words.contains(&word.to_ascii_lowercase())
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn source(&self) -> &DictionarySource {
        &self.source
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_case_insensitive() {
        let dict = Dictionary::builtin();
        assert!(dict.contains("genital"));
        assert!(dict.contains("Genital"));
        assert!(!dict.contains("soresgenital"));
        assert_eq!(dict.source(), &DictionarySource::Builtin);
    }

    #[test]
    fn from_words_drops_possessives_and_blanks() {
        let dict = Dictionary::from_words(["Aaron's", "", "  eye ", "x-ray", "Sores"]);
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("eye"));
        assert!(dict.contains("sores"));
    }

    #[test]
    fn add_words_keeps_source() {
        let mut dict = Dictionary::builtin();
        dict.add_words(["Metformin", "co-codamol"]);
        assert!(dict.contains("metformin"));
        assert!(!dict.contains("co-codamol"));
        assert_eq!(dict.source(), &DictionarySource::Builtin);
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dict = Dictionary::load_or_builtin(Path::new("/nonexistent/leafdex/words"));
        assert_eq!(dict.source(), &DictionarySource::Builtin);
        assert!(!dict.is_empty());
    }

    #[test]
    fn loads_word_file() {
        let dir = std::env::temp_dir().join(format!("leafdex-dict-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("words");
        std::fs::write(&path, "aciclovir\nherpes\neye\n").unwrap();

        let dict = Dictionary::load_or_builtin(&path);
        assert!(dict.contains("aciclovir"));
        assert!(dict.contains("breastfeeding"));
        assert_eq!(dict.source(), &DictionarySource::File(path.clone()));

        std::fs::write(&path, "1234\n").unwrap();
        let dict = Dictionary::load_or_builtin(&path);
        assert_eq!(dict.source(), &DictionarySource::Builtin);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
