//! Certificate sorting pipeline: renders scanned Russian training
//! certificates to images, OCRs them, extracts the filing fields and copies
//! each PDF into a per-program output tree with a result table alongside.

pub mod config;
pub mod pipeline;

pub use config::RunConfig;
pub use pipeline::batch::{run_batch, BatchContext, BatchError, BatchOutcome, OutputRecord};
pub use pipeline::extraction::{ExtractedFields, ExtractionError, OcrEngine, PdfPageRenderer};
