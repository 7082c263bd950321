//! Filing of processed documents into the output tree.
//!
//! Recognized documents are copied (never moved) into a per-program
//! directory under a sanitized person-name filename; unrecognized ones keep
//! their original filename under the fallback directory. No destination is
//! ever overwritten — name collisions get a numeric suffix.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::BatchError;
use crate::config::RunConfig;
use crate::pipeline::extraction::ExtractedFields;

/// Longest filesystem component produced from an extracted string.
const MAX_COMPONENT_CHARS: usize = 100;

/// Where a document ended up.
#[derive(Debug, Clone)]
pub struct FiledDocument {
    pub destination: PathBuf,
    pub recognized: bool,
}

/// Copy a source PDF to its resolved destination.
///
/// Recognized (name and program both extracted): the copy goes to
/// `<certificates>/<program>/<name>.pdf`. Otherwise the original filename is
/// kept under the unrecognized directory. The source file is never touched.
pub fn file_document(
    source: &Path,
    fields: &ExtractedFields,
    config: &RunConfig,
) -> Result<FiledDocument, BatchError> {
    let recognized = fields.is_recognized();

    let candidate = if recognized {
        // is_recognized() guarantees both fields.
        let program = sanitize_component(fields.program.as_deref().unwrap_or_default());
        let name = sanitize_component(fields.name.as_deref().unwrap_or_default());
        config
            .certificates_dir
            .join(program)
            .join(format!("{name}.pdf"))
    } else {
        let filename = source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        config.unrecognized_dir().join(filename)
    };

    if let Some(parent) = candidate.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let destination = resolve_collision(candidate);
    std::fs::copy(source, &destination)?;
    debug!(
        source = %source.display(),
        destination = %destination.display(),
        recognized,
        "Filed document"
    );

    Ok(FiledDocument {
        destination,
        recognized,
    })
}

/// Make an extracted string safe as a single path component: forbidden and
/// non-whitespace control characters become `_`, whitespace runs (tabs and
/// newlines included) collapse to single spaces, length is capped.
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            // Whitespace controls (tab, newline) must stay whitespace so the
            // collapse below folds them into single spaces.
            c if c.is_control() && !c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// First free path at the candidate location: the candidate itself, or
/// `stem_1.ext`, `stem_2.ext`, … if taken.
fn resolve_collision(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let extension = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let alternative = parent.join(format!("{stem}_{counter}.{extension}"));
        if !alternative.exists() {
            return alternative;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> RunConfig {
        RunConfig::from_base(dir)
    }

    fn recognized_fields() -> ExtractedFields {
        ExtractedFields {
            name: Some("Иванову Ивану Ивановичу".into()),
            program: Some("Государственные закупки".into()),
            certificate_number: None,
            issue_date: None,
            hours: None,
        }
    }

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(
            sanitize_component(r#"закупки: "теория"/практика?"#),
            "закупки_ _теория__практика_"
        );
    }

    #[test]
    fn sanitize_collapses_whitespace_and_caps_length() {
        assert_eq!(sanitize_component("а   б \t в"), "а б в");
        let long = "х".repeat(300);
        assert_eq!(sanitize_component(&long).chars().count(), 100);
    }

    #[test]
    fn sanitize_collapses_whitespace_controls_but_masks_the_rest() {
        // Tab and newline are whitespace: they collapse, never underscore.
        assert_eq!(sanitize_component("закупки\tтеория\nпрактика"), "закупки теория практика");
        // Non-whitespace controls are masked.
        assert_eq!(sanitize_component("закупки\u{1}теория"), "закупки_теория");
    }

    #[test]
    fn recognized_document_goes_to_program_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan001.pdf");
        std::fs::write(&source, b"%PDF-1.4 fake").unwrap();

        let filed = file_document(&source, &recognized_fields(), &config_in(dir.path())).unwrap();

        assert!(filed.recognized);
        assert_eq!(
            filed.destination,
            dir.path()
                .join("сертификаты")
                .join("Государственные закупки")
                .join("Иванову Ивану Ивановичу.pdf")
        );
        assert!(filed.destination.exists());
        assert!(source.exists(), "source must never be moved");
    }

    #[test]
    fn collision_appends_numeric_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan001.pdf");
        std::fs::write(&source, b"%PDF-1.4 fake").unwrap();
        let config = config_in(dir.path());

        let first = file_document(&source, &recognized_fields(), &config).unwrap();
        let second = file_document(&source, &recognized_fields(), &config).unwrap();
        let third = file_document(&source, &recognized_fields(), &config).unwrap();

        assert!(first.destination.ends_with("Иванову Ивану Ивановичу.pdf"));
        assert!(second.destination.ends_with("Иванову Ивану Ивановичу_1.pdf"));
        assert!(third.destination.ends_with("Иванову Ивану Ивановичу_2.pdf"));
        assert!(first.destination.exists());
        assert!(second.destination.exists());
        assert!(third.destination.exists());
    }

    #[test]
    fn unrecognized_document_keeps_original_name_in_fallback_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan001.pdf");
        std::fs::write(&source, b"%PDF-1.4 fake").unwrap();
        let config = config_in(dir.path());

        let filed = file_document(&source, &ExtractedFields::default(), &config).unwrap();

        assert!(!filed.recognized);
        assert_eq!(
            filed.destination,
            config.unrecognized_dir().join("scan001.pdf")
        );
        assert!(filed.destination.exists());

        // Collisions are suffixed in the fallback directory too.
        let again = file_document(&source, &ExtractedFields::default(), &config).unwrap();
        assert!(again.destination.ends_with("scan001_1.pdf"));
    }
}
