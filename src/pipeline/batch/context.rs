//! Per-batch accumulation state.
//!
//! One [`OutputRecord`] and one [`DocumentTiming`] are appended per input
//! document, in processing order, whether or not the document was
//! recognized.

use serde::Serialize;

use crate::pipeline::extraction::ExtractedFields;

/// Placeholder written into mandatory columns when extraction found nothing.
pub const NOT_FOUND: &str = "НЕ НАЙДЕНО";

/// One row of the result table.
///
/// Mandatory columns (name, program) carry [`NOT_FOUND`] when absent;
/// optional columns are left empty. `destination` is the resolved copy path,
/// or empty when filing itself failed.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub name: String,
    pub program: String,
    pub certificate_number: String,
    pub issue_date: String,
    pub hours: String,
    pub destination: String,
}

impl OutputRecord {
    pub fn from_fields(fields: &ExtractedFields, destination: &str) -> Self {
        Self {
            name: fields.name.clone().unwrap_or_else(|| NOT_FOUND.to_string()),
            program: fields
                .program
                .clone()
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            certificate_number: fields.certificate_number.clone().unwrap_or_default(),
            issue_date: fields.issue_date.clone().unwrap_or_default(),
            hours: fields.hours.map(|h| h.to_string()).unwrap_or_default(),
            destination: destination.to_string(),
        }
    }

    /// Both mandatory columns carry extracted values.
    pub fn is_recognized(&self) -> bool {
        self.name != NOT_FOUND && self.program != NOT_FOUND
    }
}

/// Wall-clock timing of one document, for the batch timing report.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTiming {
    pub file: String,
    pub render_secs: f64,
    pub ocr_secs: f64,
    pub total_secs: f64,
    pub text_length: usize,
}

/// Explicit batch-run state, threaded through the run by reference.
#[derive(Debug, Default)]
pub struct BatchContext {
    pub records: Vec<OutputRecord>,
    pub timings: Vec<DocumentTiming>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the document's row and its timing entry. Called exactly once
    /// per input document.
    pub fn append(&mut self, record: OutputRecord, timing: DocumentTiming) {
        self.records.push(record);
        self.timings.push(timing);
    }

    pub fn processed(&self) -> usize {
        self.records.len()
    }

    pub fn recognized(&self) -> usize {
        self.records.iter().filter(|r| r.is_recognized()).count()
    }
}
