//! Issue date extraction.
//!
//! Certificates print a course period («с 01.02.2021 по 15.03.2021») and
//! sometimes a separate registration date; the completion/issue date is the
//! last DD.MM.YYYY occurrence in reading order, so the last match wins.

use std::sync::LazyLock;

use regex::Regex;

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}\.\d{1,2}\.\d{4})").unwrap());

/// Extract the issue date as printed (no calendar validation).
pub fn extract_issue_date(text: &str) -> Option<String> {
    DATE.captures_iter(text)
        .last()
        .map(|caps| caps[1].to_string())
}
