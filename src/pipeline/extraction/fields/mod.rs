//! Structured field extraction from recognized certificate text.
//!
//! Each field has its own ordered list of (pattern, validator,
//! post-processor) tiers, evaluated until one validates. Looser tiers only
//! fire after stricter ones fail, and a candidate that fails its validator
//! counts as no match at all. "Not found" is a normal outcome — every
//! extractor returns an `Option`, nothing here raises.

pub mod date;
pub mod hours;
pub mod name;
pub mod number;
pub mod program;

use std::sync::LazyLock;

use regex::Regex;

use super::types::ExtractedFields;

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Run every field extractor over the full document text.
///
/// Sub-extractions are independent; a field that fails to validate is
/// simply absent and never affects the others.
pub fn extract_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        name: name::extract_name(text),
        program: program::extract_program(text),
        certificate_number: number::extract_certificate_number(text),
        issue_date: date::extract_issue_date(text),
        hours: hours::extract_hours(text),
    }
}
