//! Batch reports: the result table (CSV) and the timing report (JSON).
//!
//! The CSV carries a UTF-8 BOM and Russian column headers so spreadsheet
//! tools open the Cyrillic content correctly without an import dialog.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::context::{BatchContext, DocumentTiming};
use super::BatchError;

const RESULT_TABLE_NAME: &str = "table.csv";
const TIMING_REPORT_NAME: &str = "timing.json";

const CSV_HEADER: &str = "ФИО,Название,Номер,Дата,Часы,Путь к файлу";

/// Write the result table to `<debug_dir>/table.csv`.
///
/// Skipped entirely when no documents were processed.
pub fn write_result_table(context: &BatchContext, debug_dir: &Path) -> Result<(), BatchError> {
    if context.records.is_empty() {
        debug!("No records; result table not written");
        return Ok(());
    }

    let path = debug_dir.join(RESULT_TABLE_NAME);
    let mut file = std::fs::File::create(&path)?;

    // BOM first, so Excel detects UTF-8.
    write!(file, "\u{feff}")?;
    writeln!(file, "{CSV_HEADER}")?;
    for record in &context.records {
        let row = [
            record.name.as_str(),
            record.program.as_str(),
            record.certificate_number.as_str(),
            record.issue_date.as_str(),
            record.hours.as_str(),
            record.destination.as_str(),
        ]
        .iter()
        .map(|field| escape_csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
        writeln!(file, "{row}")?;
    }

    info!(path = %path.display(), rows = context.records.len(), "Result table written");
    Ok(())
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Serialize)]
struct TimingReport<'a> {
    generated_at: String,
    documents: &'a [DocumentTiming],
    average: TimingAverages,
}

#[derive(Serialize)]
struct TimingAverages {
    render_secs: f64,
    ocr_secs: f64,
    total_secs: f64,
    text_length: f64,
}

/// Write per-document and average timings to `<debug_dir>/timing.json`.
pub fn write_timing_report(context: &BatchContext, debug_dir: &Path) -> Result<(), BatchError> {
    if context.timings.is_empty() {
        debug!("No timings; timing report not written");
        return Ok(());
    }

    let count = context.timings.len() as f64;
    let report = TimingReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        documents: &context.timings,
        average: TimingAverages {
            render_secs: context.timings.iter().map(|t| t.render_secs).sum::<f64>() / count,
            ocr_secs: context.timings.iter().map(|t| t.ocr_secs).sum::<f64>() / count,
            total_secs: context.timings.iter().map(|t| t.total_secs).sum::<f64>() / count,
            text_length: context.timings.iter().map(|t| t.text_length as f64).sum::<f64>() / count,
        },
    };

    let path = debug_dir.join(TIMING_REPORT_NAME);
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;

    info!(
        avg_render_secs = format!("{:.1}", report.average.render_secs),
        avg_ocr_secs = format!("{:.1}", report.average.ocr_secs),
        avg_total_secs = format!("{:.1}", report.average.total_secs),
        avg_text_length = format!("{:.0}", report.average.text_length),
        "Timing summary"
    );
    let by_total = |t: &&DocumentTiming| (t.total_secs * 1000.0) as u64;
    if let (Some(slowest), Some(fastest)) = (
        context.timings.iter().max_by_key(by_total),
        context.timings.iter().min_by_key(by_total),
    ) {
        info!(
            slowest = %slowest.file,
            slowest_secs = format!("{:.1}", slowest.total_secs),
            fastest = %fastest.file,
            fastest_secs = format!("{:.1}", fastest.total_secs),
            "Timing extremes"
        );
    }
    info!(path = %path.display(), "Timing report written");
    Ok(())
}
