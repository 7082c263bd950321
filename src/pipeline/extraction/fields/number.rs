//! Certificate number extraction.
//!
//! Registration numbers follow a region-series-serial shape
//! (e.g. «77ПК 123456»). Strictest shape first; the series-only fallback
//! covers scans where the leading region digits were lost.

use std::sync::LazyLock;

use regex::Regex;

static NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d{2}\s*[А-ЯЁ]{2,5}\d?\s*\d{6})",
        r"(\d{2}\s+[А-ЯЁ]+\s*\d+)",
        r"([А-ЯЁ]{2,5}\s*\d{6,8})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract the certificate number as printed, surrounding whitespace trimmed.
pub fn extract_certificate_number(text: &str) -> Option<String> {
    for pattern in NUMBER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}
