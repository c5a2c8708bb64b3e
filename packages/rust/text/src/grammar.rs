//! Light, pattern-based grammar touch-ups applied after reconstruction.
//!
//! Not idempotent: a second run can add another period where the first
//! run created a new lowercase/capital pair.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Auxiliaries that put `you` in a question ("Are you taking ...?").
const QUESTION_AUXILIARIES: &[&str] = &[
    "are", "aren't", "were", "have", "has", "do", "does", "did", "will", "would", "can",
    "could", "should", "shall", "may", "might",
];

pub(crate) fn polish(text: &str) -> String {
    let mut result = terminate_sentences(text);

    result = comma_before_adverbs(&result);
    result = repair_contractions(&result);

    result
}

/// `"side effects Common ones"` → `"side effects. Common ones"`.
fn terminate_sentences(text: &str) -> String {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b([a-z]{2,}) ([A-Z][a-z]+)\b").expect("valid regex"));

    RE.replace_all(text, "$1. $2").into_owned()
}

/// `"works well however some"` → `"works well, however some"`.
fn comma_before_adverbs(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b([a-z]+) (but|however|therefore|moreover|furthermore) ([a-z]+)\b")
            .expect("valid regex")
    });

    RE.replace_all(text, "$1, $2 $3").into_owned()
}

fn repair_contractions(text: &str) -> String {
    static ITS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"\b([Ii])ts (not|important|best|safe|fine|possible|unlikely|usually|also|ok|okay|very)\b",
        )
        .expect("valid regex")
    });
    static YOU: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"\b(?:([A-Za-z']+) )?([Yy])ou (going|taking|using|trying|planning|breastfeeding|pregnant)\b",
        )
        .expect("valid regex")
    });

    let result = ITS.replace_all(text, "${1}t's $2");
    YOU.replace_all(&result, |caps: &Captures| {
        let before = caps.get(1).map(|m| m.as_str());
        if before.is_some_and(|w| QUESTION_AUXILIARIES.contains(&w.to_ascii_lowercase().as_str())) {
            return caps[0].to_string();
        }
        let lead = before.map(|w| format!("{w} ")).unwrap_or_default();
        format!("{lead}{}ou're {}", &caps[2], &caps[3])
    })
    .into_owned()
}
