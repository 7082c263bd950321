//! Batch run driver.
//!
//! Walks the input directory in deterministic order, pushes every document
//! through render → OCR → field extraction → filing, and finishes with the
//! result table and timing report. Per-document failures are absorbed: the
//! document becomes an unrecognized (or unfiled) record and the batch moves
//! on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use super::context::{BatchContext, DocumentTiming, OutputRecord};
use super::filing::file_document;
use super::report::{write_result_table, write_timing_report};
use super::BatchError;
use crate::config::RunConfig;
use crate::pipeline::extraction::{extract_fields, recognize_document, OcrEngine, PdfPageRenderer};

const PROGRESS_INTERVAL: usize = 10;

/// Final tally of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: usize,
    pub recognized: usize,
}

/// Process every `*.pdf` under the configured input directory.
///
/// Aborts only on setup problems (missing input directory, output
/// directories that cannot be created) or report-writing failures; anything
/// that goes wrong with an individual document is logged and recorded.
pub fn run_batch(
    renderer: &dyn PdfPageRenderer,
    ocr: &dyn OcrEngine,
    config: &RunConfig,
) -> Result<BatchOutcome, BatchError> {
    if !config.input_dir.is_dir() {
        return Err(BatchError::InputDirMissing(config.input_dir.clone()));
    }
    std::fs::create_dir_all(&config.certificates_dir)?;
    std::fs::create_dir_all(config.unrecognized_dir())?;
    std::fs::create_dir_all(&config.debug_dir)?;

    let pdf_files = collect_pdf_files(&config.input_dir)?;
    if pdf_files.is_empty() {
        warn!(dir = %config.input_dir.display(), "No PDF files found in input directory");
        return Ok(BatchOutcome {
            processed: 0,
            recognized: 0,
        });
    }

    info!(files = pdf_files.len(), "Starting batch");
    let batch_started = Instant::now();
    let mut context = BatchContext::new();

    for (index, pdf_path) in pdf_files.iter().enumerate() {
        info!(
            file = %pdf_path.display(),
            number = index + 1,
            total = pdf_files.len(),
            "Processing document"
        );
        process_document(renderer, ocr, config, pdf_path, &mut context);

        let done = index + 1;
        if done % PROGRESS_INTERVAL == 0 && done < pdf_files.len() {
            let elapsed = batch_started.elapsed().as_secs_f64();
            let per_file = elapsed / done as f64;
            let remaining = per_file * (pdf_files.len() - done) as f64;
            info!(
                done,
                total = pdf_files.len(),
                recognized = context.recognized(),
                elapsed_secs = format!("{elapsed:.0}"),
                remaining_secs = format!("{remaining:.0}"),
                "Batch progress"
            );
        }
    }

    write_result_table(&context, &config.debug_dir)?;
    write_timing_report(&context, &config.debug_dir)?;

    let outcome = BatchOutcome {
        processed: context.processed(),
        recognized: context.recognized(),
    };
    info!(
        processed = outcome.processed,
        recognized = outcome.recognized,
        total_secs = format!("{:.0}", batch_started.elapsed().as_secs_f64()),
        "Batch finished"
    );
    Ok(outcome)
}

/// All `*.pdf` files directly under `dir`, sorted case-insensitively by
/// filename so runs are deterministic across filesystems.
fn collect_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort_by_key(|path| {
        path.file_name()
            .map(|f| f.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

/// Process one document and append exactly one record and timing entry.
fn process_document(
    renderer: &dyn PdfPageRenderer,
    ocr: &dyn OcrEngine,
    config: &RunConfig,
    pdf_path: &Path,
    context: &mut BatchContext,
) {
    let started = Instant::now();
    let file_label = pdf_path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    let document = match std::fs::read(pdf_path) {
        Ok(bytes) => recognize_document(renderer, ocr, &bytes, config.render_dpi),
        Err(e) => {
            error!(file = %file_label, error = %e, "Failed to read PDF; treated as empty");
            recognize_document(renderer, ocr, &[], config.render_dpi)
        }
    };

    write_debug_sidecar(config, pdf_path, &document.text);

    let fields = extract_fields(&document.text);
    let destination = match file_document(pdf_path, &fields, config) {
        Ok(filed) => filed.destination.display().to_string(),
        Err(e) => {
            // The extracted row is still worth keeping; destination stays
            // empty to mark the unfiled copy.
            error!(file = %file_label, error = %e, "Failed to file document");
            String::new()
        }
    };

    let record = OutputRecord::from_fields(&fields, &destination);
    if record.is_recognized() {
        info!(file = %file_label, name = %record.name, "Recognized");
    } else {
        warn!(file = %file_label, "Unrecognized; mandatory field missing");
    }

    context.append(
        record,
        DocumentTiming {
            file: file_label,
            render_secs: document.render_secs,
            ocr_secs: document.ocr_secs,
            total_secs: started.elapsed().as_secs_f64(),
            text_length: document.text.chars().count(),
        },
    );
}

/// Persist the full recognized text next to the other diagnostics,
/// regardless of extraction success.
fn write_debug_sidecar(config: &RunConfig, pdf_path: &Path, text: &str) {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let sidecar = config.debug_dir.join(format!("{stem}_ocr_text.txt"));
    if let Err(e) = std::fs::write(&sidecar, text) {
        warn!(path = %sidecar.display(), error = %e, "Failed to write OCR text sidecar");
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;
    use crate::pipeline::extraction::{ExtractionError, MockOcrEngine};

    /// One blank page per document; the mock OCR supplies the text.
    struct SinglePageRenderer;

    impl PdfPageRenderer for SinglePageRenderer {
        fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
            Ok(1)
        }

        fn render_page(
            &self,
            _pdf_bytes: &[u8],
            _page_number: usize,
            _dpi: u32,
        ) -> Result<DynamicImage, ExtractionError> {
            Ok(DynamicImage::new_luma8(16, 16))
        }
    }

    const CERTIFICATE_TEXT: &str = "Настоящее удостоверение выдано Иванову Ивану Ивановичу \
         в том что он прошел обучение по программе \
         «Государственные и муниципальные закупки: теория и практика» \
         в объеме 144 часов 15.03.2021 номер 77ПК 123456";

    fn base_with_inputs(names: &[&str]) -> (tempfile::TempDir, RunConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::from_base(dir.path());
        std::fs::create_dir_all(&config.input_dir).unwrap();
        for name in names {
            std::fs::write(config.input_dir.join(name), b"%PDF-1.4 fake").unwrap();
        }
        (dir, config)
    }

    #[test]
    fn missing_input_directory_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::from_base(dir.path());
        let ocr = MockOcrEngine::new("текст");
        let result = run_batch(&SinglePageRenderer, &ocr, &config);
        assert!(matches!(result, Err(BatchError::InputDirMissing(_))));
    }

    #[test]
    fn empty_input_directory_is_a_clean_no_op() {
        let (_dir, config) = base_with_inputs(&[]);
        let ocr = MockOcrEngine::new("текст");
        let outcome = run_batch(&SinglePageRenderer, &ocr, &config).unwrap();
        assert_eq!(
            outcome,
            BatchOutcome {
                processed: 0,
                recognized: 0
            }
        );
        assert!(!config.debug_dir.join("table.csv").exists());
    }

    #[test]
    fn recognized_document_is_filed_and_recorded() {
        let (_dir, config) = base_with_inputs(&["scan001.pdf"]);
        let ocr = MockOcrEngine::new(CERTIFICATE_TEXT);

        let outcome = run_batch(&SinglePageRenderer, &ocr, &config).unwrap();
        assert_eq!(
            outcome,
            BatchOutcome {
                processed: 1,
                recognized: 1
            }
        );

        // Filed copy under the program directory, named after the person.
        let program_dir = config
            .certificates_dir
            .join("Государственные и муниципальные закупки_ теория и практика");
        assert!(program_dir.join("Иванову Ивану Ивановичу.pdf").exists());

        // Source untouched, sidecar and reports written.
        assert!(config.input_dir.join("scan001.pdf").exists());
        assert!(config.debug_dir.join("scan001_ocr_text.txt").exists());
        assert!(config.debug_dir.join("table.csv").exists());
        assert!(config.debug_dir.join("timing.json").exists());
    }

    #[test]
    fn duplicate_documents_get_suffixed_copies() {
        let (_dir, config) = base_with_inputs(&["a.pdf", "b.pdf"]);
        let ocr = MockOcrEngine::new(CERTIFICATE_TEXT);

        let outcome = run_batch(&SinglePageRenderer, &ocr, &config).unwrap();
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.recognized, 2);

        let program_dir = config
            .certificates_dir
            .join("Государственные и муниципальные закупки_ теория и практика");
        assert!(program_dir.join("Иванову Ивану Ивановичу.pdf").exists());
        assert!(program_dir.join("Иванову Ивану Ивановичу_1.pdf").exists());
    }

    #[test]
    fn optional_fields_may_be_empty_in_a_recognized_record() {
        let (_dir, config) = base_with_inputs(&["scan003.pdf"]);
        // Name and program present, but no number, date or hour count.
        let ocr = MockOcrEngine::new(
            "Настоящее удостоверение выдано Иванову Ивану Ивановичу в том что \
             он прошел обучение О контрактной системе в сфере закупок",
        );

        let outcome = run_batch(&SinglePageRenderer, &ocr, &config).unwrap();
        assert_eq!(outcome.recognized, 1);

        let table = std::fs::read_to_string(config.debug_dir.join("table.csv")).unwrap();
        let row = table.lines().nth(1).unwrap();
        assert!(row.starts_with("Иванову Ивану Ивановичу,О контрактной системе в сфере закупки,,,,"));
        assert!(!table.contains("НЕ НАЙДЕНО"));
    }

    #[test]
    fn unrecognized_document_lands_in_fallback_directory() {
        let (_dir, config) = base_with_inputs(&["scan002.pdf"]);
        let ocr = MockOcrEngine::new("нечитаемый мусор без полей");

        let outcome = run_batch(&SinglePageRenderer, &ocr, &config).unwrap();
        assert_eq!(
            outcome,
            BatchOutcome {
                processed: 1,
                recognized: 0
            }
        );
        assert!(config.unrecognized_dir().join("scan002.pdf").exists());
        assert!(config.input_dir.join("scan002.pdf").exists());

        let table = std::fs::read_to_string(config.debug_dir.join("table.csv")).unwrap();
        assert!(table.contains("НЕ НАЙДЕНО"));
    }

    #[test]
    fn non_pdf_files_are_ignored_and_order_is_sorted() {
        let (_dir, config) = base_with_inputs(&["B.pdf", "a.pdf", "notes.txt"]);
        std::fs::write(config.input_dir.join("c.PDF"), b"%PDF").unwrap();

        let files = collect_pdf_files(&config.input_dir).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "B.pdf", "c.PDF"]);
    }
}
