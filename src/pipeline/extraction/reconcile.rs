//! Per-page reconciliation of OCR attempts.
//!
//! Every page is OCRed once per preprocessing variant (exactly three calls,
//! no per-variant retries). Empty results and engine errors drop the variant;
//! the longest surviving text wins the page, ties going to the earlier
//! variant in the fixed order. A page where everything fails simply
//! contributes no text — a bad page degrades quality, it never aborts the
//! document or the batch.

use std::time::Instant;

use tracing::{debug, warn};

use super::preprocess::build_variants;
use super::types::{OcrEngine, PageOutcome, PdfPageRenderer};

/// Recognized text of a whole document plus the timing the batch report needs.
#[derive(Debug, Clone)]
pub struct RecognizedDocument {
    /// Space-joined concatenation of per-page winning texts, in page order.
    pub text: String,
    pub page_count: usize,
    /// Pages that produced text, with the variant that won each.
    pub pages: Vec<PageOutcome>,
    /// Time spent rasterizing pages.
    pub render_secs: f64,
    /// Time spent in preprocessing + OCR calls.
    pub ocr_secs: f64,
}

/// OCR one document end to end.
///
/// Failures are absorbed at the lowest level: a variant that errors is
/// skipped, a page whose render or every OCR attempt fails contributes
/// nothing, and a document that cannot be opened at all yields empty text
/// with zero pages. The caller classifies an empty-text document through
/// field extraction (all fields absent → unrecognized).
pub fn recognize_document(
    renderer: &dyn PdfPageRenderer,
    ocr: &dyn OcrEngine,
    pdf_bytes: &[u8],
    dpi: u32,
) -> RecognizedDocument {
    let page_count = match renderer.page_count(pdf_bytes) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "Failed to open PDF; document yields no text");
            return RecognizedDocument {
                text: String::new(),
                page_count: 0,
                pages: Vec::new(),
                render_secs: 0.0,
                ocr_secs: 0.0,
            };
        }
    };

    let mut pages = Vec::new();
    let mut render_secs = 0.0;
    let mut ocr_secs = 0.0;

    for page_number in 0..page_count {
        let render_started = Instant::now();
        let page_image = match renderer.render_page(pdf_bytes, page_number, dpi) {
            Ok(image) => image,
            Err(e) => {
                warn!(page = page_number, error = %e, "Page render failed; skipping page");
                render_secs += render_started.elapsed().as_secs_f64();
                continue;
            }
        };
        render_secs += render_started.elapsed().as_secs_f64();

        let ocr_started = Instant::now();
        if let Some(outcome) = recognize_page(ocr, &page_image, page_number) {
            pages.push(outcome);
        }
        ocr_secs += ocr_started.elapsed().as_secs_f64();
    }

    let text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    RecognizedDocument {
        text,
        page_count,
        pages,
        render_secs,
        ocr_secs,
    }
}

/// OCR a single page image across all preprocessing variants and keep the
/// longest non-empty result. Returns `None` when every variant fails.
pub fn recognize_page(
    ocr: &dyn OcrEngine,
    page_image: &image::DynamicImage,
    page_number: usize,
) -> Option<PageOutcome> {
    let variants = match build_variants(page_image) {
        Ok(v) => v,
        Err(e) => {
            warn!(page = page_number, error = %e, "Preprocessing failed; skipping page");
            return None;
        }
    };

    let mut best: Option<PageOutcome> = None;
    let mut candidates = 0usize;

    for variant in &variants {
        let tokens = match ocr.recognize(&variant.png_bytes) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!(
                    page = page_number,
                    variant = variant.kind.as_str(),
                    error = %e,
                    "OCR attempt failed"
                );
                continue;
            }
        };

        let text = tokens.join(" ");
        if text.trim().is_empty() {
            continue;
        }
        candidates += 1;

        // Strict "greater than" keeps the earlier variant on ties.
        let length = text.chars().count();
        let is_better = best
            .as_ref()
            .map_or(true, |b| length > b.text.chars().count());
        if is_better {
            best = Some(PageOutcome {
                page_number,
                text,
                variant: variant.kind,
            });
        }
    }

    if let Some(ref outcome) = best {
        if candidates > 1 {
            debug!(
                page = page_number,
                variant = outcome.variant.as_str(),
                chars = outcome.text.chars().count(),
                "Best OCR variant selected"
            );
        }
    }

    best
}
