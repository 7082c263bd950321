use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use certsort::pipeline::extraction::{OcrEngine, PdfiumRenderer};
use certsort::{run_batch, BatchError, BatchOutcome, RunConfig};

/// Sort scanned training-certificate PDFs by program and person.
///
/// Reads `*.pdf` from the input directory, OCRs each document, extracts the
/// certificate fields and files a copy under `<output>/<program>/<name>.pdf`.
/// Documents missing a mandatory field go to the fallback directory
/// untouched; a result table and timing report land in the debug directory.
#[derive(Parser, Debug)]
#[command(name = certsort::config::APP_NAME, version = certsort::config::APP_VERSION, about)]
struct Args {
    /// Base directory; input/, сертификаты/ and debug/ are resolved under it
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Override the input directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Override the output (certificates) directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the debug directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Page rasterization resolution
    #[arg(long, default_value_t = certsort::config::RENDER_DPI)]
    dpi: u32,

    /// Explicit tessdata directory for the OCR engine
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// OCR language(s), e.g. "rus" or "rus+eng"
    #[arg(long, default_value = "rus")]
    lang: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(outcome) => {
            if outcome.processed > outcome.recognized {
                info!(
                    unrecognized = outcome.processed - outcome.recognized,
                    "Some documents need manual review in the fallback directory"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Batch failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<BatchOutcome, BatchError> {
    let mut config = RunConfig::from_base(&args.base_dir);
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.certificates_dir = dir.clone();
    }
    if let Some(dir) = &args.debug_dir {
        config.debug_dir = dir.clone();
    }
    config.render_dpi = args.dpi;

    let renderer = PdfiumRenderer::new()?;
    let ocr = build_ocr(args)?;
    run_batch(&renderer, ocr.as_ref(), &config)
}

#[cfg(feature = "ocr")]
fn build_ocr(args: &Args) -> Result<Box<dyn OcrEngine>, BatchError> {
    use certsort::pipeline::extraction::TesseractOcr;

    let mut engine = TesseractOcr::new().with_language(&args.lang);
    if let Some(dir) = &args.tessdata {
        engine = engine.with_tessdata(dir)?;
    }
    Ok(Box::new(engine))
}

#[cfg(not(feature = "ocr"))]
fn build_ocr(_args: &Args) -> Result<Box<dyn OcrEngine>, BatchError> {
    use certsort::ExtractionError;

    Err(BatchError::Extraction(ExtractionError::OcrInit(
        "built without the `ocr` feature; rebuild with `--features ocr`".to_string(),
    )))
}
