//! OCR engine adapter.
//!
//! The recognition capability is opaque to the pipeline: an engine takes an
//! encoded image and returns recognized text tokens. The bundled backend is
//! Tesseract (feature `ocr`); everything else in the crate is exercised
//! through `MockOcrEngine` without the native library.

use super::types::OcrEngine;
use super::ExtractionError;

/// Tesseract-backed OCR engine for Russian certificate scans.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: Option<std::path::PathBuf>,
    lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Engine with the system tessdata location and Russian language data.
    pub fn new() -> Self {
        Self {
            tessdata_dir: None,
            lang: "rus".to_string(),
        }
    }

    /// Use an explicit tessdata directory; verifies the language data exists.
    pub fn with_tessdata(mut self, dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !dir.join(format!("{}.traineddata", self.lang)).exists() {
            return Err(ExtractionError::TessdataNotFound(dir.to_path_buf()));
        }
        self.tessdata_dir = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Set language(s) for OCR (e.g., "rus", "rus+eng").
    pub fn with_language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_png: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let datapath = self.tessdata_dir.as_ref().and_then(|p| p.to_str());

        let tess = tesseract::Tesseract::new(datapath, Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_png)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        Ok(text.split_whitespace().map(str::to_string).collect())
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub tokens: Vec<String>,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_png: &[u8]) -> Result<Vec<String>, ExtractionError> {
        Ok(self.tokens.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ocr_returns_configured_tokens() {
        let engine = MockOcrEngine::new("удостоверение выдано Иванову");
        let tokens = engine.recognize(b"fake_image_bytes").unwrap();
        assert_eq!(tokens, vec!["удостоверение", "выдано", "Иванову"]);
    }

    #[test]
    fn mock_ocr_empty_text_yields_no_tokens() {
        let engine = MockOcrEngine::new("   ");
        assert!(engine.recognize(b"fake").unwrap().is_empty());
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn tesseract_rejects_missing_tessdata() {
        let dir = tempfile::tempdir().unwrap();
        let result = TesseractOcr::new().with_tessdata(dir.path());
        assert!(matches!(result, Err(ExtractionError::TessdataNotFound(_))));
    }
}
