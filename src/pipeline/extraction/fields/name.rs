//! Recipient name extraction.
//!
//! Certificates phrase the recipient in the dative case between a fixed
//! anchor pair («удостоверение выдано … в том, что»). The anchor tiers run
//! over punctuation-stripped text so OCR commas and stray quote marks do not
//! break the window; the last-resort tier looks for a bare dative
//! Surname-Name-Patronymic triple anywhere in the raw text.

use std::sync::LazyLock;

use regex::Regex;

use super::collapse_whitespace;

/// Strip everything except word characters and whitespace before anchor
/// matching. OCR peppers the anchor window with commas and quote marks.
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Anchor windows, strictest phrasing first.
static ANCHOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)Настоящее удостоверение выдано\s+(.*?)\s+в\s+том",
        r"(?is)удостоверение выдано\s+(.*?)\s+в\s+том",
        r"(?is)выдано\s+(.*?)\s+в\s+том\s+что",
        r"(?is)выдано\s+([А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Fallback: a capitalized dative triple (surname ending, given name,
/// patronymic ending) anywhere in the raw text. Runs case-sensitively so
/// ordinary running text does not produce false triples.
static DATIVE_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([А-ЯЁ][а-яё]+(?:ой|ей|ому|ему|ной|ному|ской|ский)\s+[А-ЯЁ][а-яё]+(?:е|у|ь)?\s+[А-ЯЁ][а-яё]+(?:ичу|овичу|евичу|ичем|овичем|евичем|овне|евне|ичне))",
    )
    .unwrap()
});

/// Extract the recipient's full name (dative form, as printed).
pub fn extract_name(text: &str) -> Option<String> {
    let cleaned = collapse_whitespace(&PUNCTUATION.replace_all(text, " "));

    for pattern in ANCHOR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&cleaned) {
            let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if is_valid_person_name(candidate) {
                return Some(normalize_case(candidate));
            }
        }
    }

    if let Some(caps) = DATIVE_TRIPLE.captures(text) {
        let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if is_valid_person_name(candidate) {
            return Some(normalize_case(candidate));
        }
    }

    None
}

/// A plausible Russian full name: 2-4 words, each at least two characters
/// with an uppercase initial.
fn is_valid_person_name(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words.iter().all(|w| {
        w.chars().count() >= 2 && w.chars().next().map_or(false, |c| c.is_uppercase())
    })
}

/// Re-case each word to Capital-initial, lowercase rest. Collapses the
/// ALL-CAPS rendering many certificates use.
fn normalize_case(candidate: &str) -> String {
    candidate
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
