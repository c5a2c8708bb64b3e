//! Heuristic repair of text that lost its word and sentence boundaries.
//!
//! [`TextPipeline::reconstruct`] runs the fixed boundary passes;
//! [`TextPipeline::repair`] adds the grammar post-pass and is what every
//! extraction call site uses for paragraph bodies.

mod dictionary;
mod grammar;
mod reconstruct;

use std::sync::Arc;

pub use dictionary::{Dictionary, DictionarySource};

/// The text reconstruction pipeline, parameterized by its dictionary.
///
/// Cheap to clone; the dictionary is shared.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    dictionary: Arc<Dictionary>,
}

impl TextPipeline {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
        }
    }

    /// Boundary passes only: spacing characters, case/digit transitions,
    /// dictionary splits, known fixes, whitespace.
    pub fn reconstruct(&self, text: &str) -> String {
        reconstruct::run_passes(text, &self.dictionary)
    }

    /// [`reconstruct`](Self::reconstruct) followed by the grammar post-pass.
    pub fn repair(&self, text: &str) -> String {
        grammar::polish(&self.reconstruct(text))
    }

    /// A pipeline whose dictionary also knows the words of `names`, so item
    /// names are never split apart. `"Co-codamol"` adds `co` and `codamol`.
    pub fn with_vocabulary<'a, I>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dictionary = Dictionary::clone(&self.dictionary);
        dictionary.add_words(
            names
                .into_iter()
                .flat_map(|name| name.split(|c: char| !c.is_ascii_alphabetic())),
        );
        Self::new(dictionary)
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

impl Default for TextPipeline {
    fn default() -> Self {
        Self::new(Dictionary::builtin())
    }
}
