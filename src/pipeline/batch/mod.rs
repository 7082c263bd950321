//! Batch processing: walk an input directory of certificate PDFs, recognize
//! and extract each one, file the copies, and write the result table plus a
//! timing report.
//!
//! All per-batch state lives in an explicit [`BatchContext`] threaded through
//! the run; there is no ambient mutable state.

pub mod context;
pub mod filing;
pub mod report;
pub mod runner;

use std::path::PathBuf;

use thiserror::Error;

pub use context::{BatchContext, DocumentTiming, OutputRecord, NOT_FOUND};
pub use filing::FiledDocument;
pub use runner::{run_batch, BatchOutcome};

/// Errors that abort a batch run. Per-document failures are absorbed inside
/// the run and surface as unrecognized records instead.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory not found: {0}")]
    InputDirMissing(PathBuf),

    #[error(transparent)]
    Extraction(#[from] crate::pipeline::extraction::ExtractionError),

    #[error("Failed to serialize timing report: {0}")]
    Json(#[from] serde_json::Error),
}
