//! Course volume (hours) extraction.
//!
//! The hour count is usually printed more than once (volume phrase, totals
//! row, period summary), so every pattern contributes candidates and the
//! most frequent plausible value wins. Ties keep the value seen first,
//! which favors the stricter patterns earlier in the list.

use std::sync::LazyLock;

use regex::Regex;

/// Plausible course volume range; filters page numbers, years and prices.
const MIN_HOURS: u32 = 8;
const MAX_HOURS: u32 = 1000;

static HOUR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)в\s*объ[её]ме\s*(\d+)\s*час",
        r"(?i)Всего\s*(\d+)",
        r"(?i)(\d+)\s*час[аов]?(?:\s|$)",
        r"(?i)объ[её]мс\s*(\d+)",
        r"(?i)объ[её]не\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract the course volume in hours (mode of all plausible candidates).
pub fn extract_hours(text: &str) -> Option<u32> {
    let mut candidates: Vec<u32> = Vec::new();
    for pattern in HOUR_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Ok(value) = caps[1].parse::<u32>() {
                if (MIN_HOURS..=MAX_HOURS).contains(&value) {
                    candidates.push(value);
                }
            }
        }
    }
    mode_first_seen(&candidates)
}

/// Most frequent value; on equal counts the value encountered first wins.
fn mode_first_seen(values: &[u32]) -> Option<u32> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    // max_by_key would return the last maximum; scan for the first instead.
    let best = counts.iter().map(|(_, count)| *count).max()?;
    counts
        .iter()
        .find(|(_, count)| *count == best)
        .map(|(value, _)| *value)
}
