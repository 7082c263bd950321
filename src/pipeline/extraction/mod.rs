pub mod fields;
pub mod ocr;
pub mod pdf_renderer;
pub mod preprocess;
pub mod reconcile;
pub mod types;

pub use fields::extract_fields;
pub use ocr::MockOcrEngine;
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;
pub use pdf_renderer::PdfiumRenderer;
pub use reconcile::{recognize_document, RecognizedDocument};
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),
}
