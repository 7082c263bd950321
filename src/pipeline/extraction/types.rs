use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Fields pulled out of a document's recognized text.
///
/// `name` and `program` are the mandatory pair: a document is only filed
/// under a program directory when both validated. Everything else degrades
/// to `None` without affecting the success classification. A candidate that
/// failed its validator is reported as absent, never as a raw match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Validated, re-cased person name (e.g. "Иванов Иван Иванович").
    pub name: Option<String>,
    /// Cleaned training-program title.
    pub program: Option<String>,
    /// Certificate number as printed (whitespace trimmed).
    pub certificate_number: Option<String>,
    /// Issue date in `DD.MM.YYYY` form, last occurrence in the document.
    pub issue_date: Option<String>,
    /// Course volume in hours, within [8, 1000].
    pub hours: Option<u32>,
}

impl ExtractedFields {
    /// Both mandatory fields present — the document can be filed by program.
    pub fn is_recognized(&self) -> bool {
        self.name.is_some() && self.program.is_some()
    }
}

/// One alternate rendering of a page image, tried as an independent OCR input.
///
/// The fixed order doubles as the tie-break order when several variants
/// produce equally long text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    /// Grayscale, 2x upscale, denoise, CLAHE, adaptive binarization.
    Enhanced,
    /// Grayscale, linear contrast stretch, mild smoothing.
    Simple,
    /// The page exactly as rasterized.
    Original,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Enhanced => "enhanced",
            VariantKind::Simple => "simple",
            VariantKind::Original => "original",
        }
    }
}

/// A named preprocessing variant, encoded and ready for the OCR engine.
pub struct PreprocessedVariant {
    pub kind: VariantKind,
    pub png_bytes: Vec<u8>,
}

/// Winning OCR result for one page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page_number: usize,
    pub text: String,
    /// Which preprocessing variant produced the winning text.
    pub variant: VariantKind,
}

/// OCR engine abstraction (allows mocking for tests).
///
/// Contract: given an encoded image, return the recognized text tokens.
/// The caller joins tokens with single spaces; an error means "no text for
/// this variant" and is absorbed at the variant level.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_png: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// PDF page rasterization abstraction.
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<DynamicImage, ExtractionError>;
}
