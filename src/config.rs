use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "certsort";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rasterization resolution for PDF pages handed to OCR.
/// 300 DPI is the sweet spot for scanned certificate text.
pub const RENDER_DPI: u32 = 300;

/// Directory names mirror the production layout the batch has always used:
/// PDFs are picked up from `input/`, filed under `сертификаты/<program>/`,
/// failures land in `сертификаты/Неопознанные/`, diagnostics in `debug/`.
pub const INPUT_DIR_NAME: &str = "input";
pub const CERTIFICATES_DIR_NAME: &str = "сертификаты";
pub const UNRECOGNIZED_DIR_NAME: &str = "Неопознанные";
pub const DEBUG_DIR_NAME: &str = "debug";

/// Resolved directory layout for one batch run.
///
/// Threaded explicitly through the pipeline instead of being read from
/// ambient process state, so tests can point a run at a temp directory.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory scanned for `*.pdf` input files.
    pub input_dir: PathBuf,
    /// Root of the per-program output tree.
    pub certificates_dir: PathBuf,
    /// Debug sidecars (`<stem>_ocr_text.txt`), result table and timing stats.
    pub debug_dir: PathBuf,
    /// Page rasterization resolution.
    pub render_dpi: u32,
}

impl RunConfig {
    /// Standard layout rooted at `base`: `input/`, `сертификаты/`, `debug/`.
    pub fn from_base(base: &Path) -> Self {
        Self {
            input_dir: base.join(INPUT_DIR_NAME),
            certificates_dir: base.join(CERTIFICATES_DIR_NAME),
            debug_dir: base.join(DEBUG_DIR_NAME),
            render_dpi: RENDER_DPI,
        }
    }

    /// Fallback directory for documents missing a mandatory field.
    pub fn unrecognized_dir(&self) -> PathBuf {
        self.certificates_dir.join(UNRECOGNIZED_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_under_base() {
        let config = RunConfig::from_base(Path::new("/work"));
        assert_eq!(config.input_dir, Path::new("/work/input"));
        assert_eq!(config.certificates_dir, Path::new("/work/сертификаты"));
        assert_eq!(config.debug_dir, Path::new("/work/debug"));
        assert_eq!(config.render_dpi, 300);
    }

    #[test]
    fn unrecognized_dir_under_certificates() {
        let config = RunConfig::from_base(Path::new("/work"));
        let unknown = config.unrecognized_dir();
        assert!(unknown.starts_with(&config.certificates_dir));
        assert!(unknown.ends_with(UNRECOGNIZED_DIR_NAME));
    }
}
