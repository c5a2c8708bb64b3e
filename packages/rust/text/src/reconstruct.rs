//! Boundary reconstruction passes.
//!
//! Flat text extraction glues neighbouring blocks together
//! (`"cold soresgenital herpeseye infections"`). Each pass here is a
//! whole-string rewrite `&str -> String`, applied in a fixed order.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::dictionary::Dictionary;

/// Shortest dictionary piece a glued word may be split into. Full word lists
/// carry many three-letter words ("met", "for", "min") that would otherwise
/// carve up drug names.
const MIN_PIECE: usize = 4;

/// Shortest lead-word piece ("eye").
const MIN_LEAD_PIECE: usize = 3;

/// Anatomical and medical words that often start a glued-on phrase.
/// A piece starting with one of these counts even if the dictionary lacks it.
const LEAD_WORDS: &[&str] = &[
    "genital", "eye", "skin", "mouth", "stomach", "chest", "throat", "blood", "liver",
    "kidney", "bladder", "muscle", "breast", "joint",
];

/// Recurring mis-joins in leaflet text that the generic passes miss.
const KNOWN_FIXES: &[(&str, &str)] = &[
    ("Call 111or", "Call 111 or"),
    ("111online", "111 online"),
    ("A&Enow", "A&E now"),
    ("A&Eif", "A&E if"),
    ("999or", "999 or"),
    (" ofthe ", " of the "),
    (" tothe ", " to the "),
    (" inthe ", " in the "),
    ("side effectsof", "side effects of"),
    ("pharmacistor", "pharmacist or"),
    ("doctoror", "doctor or"),
];

/// Run every pass in order.
pub(crate) fn run_passes(text: &str, dict: &Dictionary) -> String {
    let mut result = normalize_spacing_chars(text);

    result = insert_boundaries(&result);
    result = split_glued_words(&result, dict);
    result = apply_known_fixes(&result);
    result = collapse_whitespace(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Non-breaking spaces and dashes
// ---------------------------------------------------------------------------

fn normalize_spacing_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{a0}' | '\u{202f}' | '\u{2013}' | '\u{2014}' => ' ',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 2: Case and digit transitions
// ---------------------------------------------------------------------------

/// Insert a space at transitions that never occur inside a single word.
fn insert_boundaries(text: &str) -> String {
    // Punctuation after a lowercase letter or bracket, then a capital:
    // "dose.Take" but not "U.K."
    static PUNCT_UPPER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([a-z)\]][.!?;:,])([A-Z])").expect("valid regex"));
    static LOWER_UPPER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));
    static LETTER_DIGIT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([A-Za-z])([0-9])").expect("valid regex"));
    static DIGIT_UPPER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([0-9])([A-Z])").expect("valid regex"));
    static COLON_LOWER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r":([a-z])").expect("valid regex"));

    let result = PUNCT_UPPER.replace_all(text, "$1 $2");
    let result = LOWER_UPPER.replace_all(&result, "$1 $2");
    let result = LETTER_DIGIT.replace_all(&result, "$1 $2");
    let result = DIGIT_UPPER.replace_all(&result, "$1 $2");
    COLON_LOWER.replace_all(&result, ": $1").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Dictionary-guided splitting
// ---------------------------------------------------------------------------

/// Split words that are not in the dictionary but are a concatenation of
/// dictionary words (or lead-word phrases).
fn split_glued_words(text: &str, dict: &Dictionary) -> String {
    static WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[A-Za-z][a-z]{5,}").expect("valid regex"));

    WORD_RE
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            let lower = token.to_ascii_lowercase();
            if dict.contains(&lower) {
                return token.to_string();
            }
            match segment(&lower, dict) {
                Some(cuts) => join_at(token, &cuts),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Cheapest segmentation of `word` into at least two pieces.
///
/// Dictionary pieces of at least [`MIN_PIECE`] letters cost 1, pieces
/// starting with a lead word cost 2; ties go to fewer pieces. Returns the byte offsets to cut at, or `None` if no segmentation
/// exists. `word` must be ASCII lowercase.
fn segment(word: &str, dict: &Dictionary) -> Option<Vec<usize>> {
    let n = word.len();
    // best[i]: (cost, pieces, previous cut) for word[..i]
    let mut best: Vec<Option<(u32, u32, usize)>> = vec![None; n + 1];
    best[0] = Some((0, 0, 0));

    for end in MIN_LEAD_PIECE..=n {
        for start in 0..=end - MIN_LEAD_PIECE {
            if start == 0 && end == n {
                continue;
            }
            let Some((cost, pieces, _)) = best[start] else {
                continue;
            };
            let piece = &word[start..end];
            let piece_cost = if piece.len() >= MIN_PIECE && dict.contains(piece) {
                1
            } else if LEAD_WORDS.iter().any(|lead| piece.starts_with(lead)) {
                2
            } else {
                continue;
            };

            let candidate = (cost + piece_cost, pieces + 1, start);
            let better = match best[end] {
                Some((c, p, _)) => (candidate.0, candidate.1) < (c, p),
                None => true,
            };
            if better {
                best[end] = Some(candidate);
            }
        }
    }

    best[n]?;

    let mut cuts = Vec::new();
    let mut i = n;
    while i > 0 {
        let Some((_, _, prev)) = best[i] else {
            break;
        };
        if prev > 0 {
            cuts.push(prev);
        }
        i = prev;
    }
    cuts.reverse();
    Some(cuts)
}

fn join_at(token: &str, cuts: &[usize]) -> String {
    let mut out = String::with_capacity(token.len() + cuts.len());
    let mut last = 0;
    for &cut in cuts {
        out.push_str(&token[last..cut]);
        out.push(' ');
        last = cut;
    }
    out.push_str(&token[last..]);
    out
}

// ---------------------------------------------------------------------------
// Pass 4: Known mis-joins
// ---------------------------------------------------------------------------

fn apply_known_fixes(text: &str) -> String {
    let mut result = text.to_string();
    for (bad, good) in KNOWN_FIXES {
        if result.contains(bad) {
            result = result.replace(bad, good);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Pass 5: Whitespace
// ---------------------------------------------------------------------------

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
