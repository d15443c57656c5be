//! Document extraction
//!
//! Turns an uploaded spreadsheet or PDF into text, detected financial tables
//! and a small set of metrics. Every failure comes back as a labelled
//! [`ExtractionFailure`]; nothing here returns a raw library error.

pub mod metrics;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod spreadsheet;

use crate::models::{ExtractionFailure, ExtractionOutcome, FileKind};
use std::path::Path;
use tracing::{info, warn};

pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn process(path: &Path, kind: FileKind) -> ExtractionOutcome {
        info!(path = %path.display(), kind = %kind, "Processing document");

        let outcome = match kind {
            FileKind::Excel => Self::process_spreadsheet(path),
            FileKind::Pdf => Self::process_pdf(path),
        };

        match &outcome {
            Ok(result) => info!(
                chars = result.text_len(),
                tables = result.tables.len(),
                metrics = result.metrics.len(),
                "Document processed"
            ),
            Err(failure) => warn!("Document processing failed: {}", failure),
        }

        outcome
    }

    /// Entry point for callers holding the kind as a string ("pdf" / "excel")
    pub fn process_named(path: &Path, kind: &str) -> ExtractionOutcome {
        match kind {
            "excel" => Self::process(path, FileKind::Excel),
            "pdf" => Self::process(path, FileKind::Pdf),
            other => Err(ExtractionFailure::new(format!(
                "Unsupported file type: {}",
                other
            ))),
        }
    }

    fn process_spreadsheet(path: &Path) -> ExtractionOutcome {
        let sheets = spreadsheet::read_workbook(path)
            .map_err(|e| ExtractionFailure::new(format!("Excel processing failed: {}", e)))?;
        Ok(spreadsheet::analyze_sheets(sheets))
    }

    #[cfg(feature = "pdf")]
    fn process_pdf(path: &Path) -> ExtractionOutcome {
        let pages = pdf::read_pages(path)
            .map_err(|e| ExtractionFailure::new(format!("PDF processing failed: {}", e)))?;
        Ok(pdf::analyze_pages(pages))
    }

    #[cfg(not(feature = "pdf"))]
    fn process_pdf(_path: &Path) -> ExtractionOutcome {
        Err(ExtractionFailure::new(
            "PDF processing library not available. Rebuild with the `pdf` feature.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_labelled() {
        let failure = DocumentExtractor::process_named(Path::new("x.doc"), "word").unwrap_err();
        assert_eq!(failure.message, "Unsupported file type: word");
    }

    #[test]
    fn test_missing_spreadsheet_is_labelled() {
        let dir = tempfile::tempdir().unwrap();
        let failure =
            DocumentExtractor::process(&dir.path().join("absent.xlsx"), FileKind::Excel)
                .unwrap_err();
        assert!(failure.message.starts_with("Excel processing failed: "));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_document_end_to_end() {
        let bytes = pdf::fixtures::pdf_with_pages(&["Joe's Motorbike Tyres", "Revenue: $52,000"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joe.pdf");
        std::fs::write(&path, bytes).unwrap();

        let result = DocumentExtractor::process_named(&path, "pdf").unwrap();
        assert_eq!(result.page_count(), Some(2));
        assert_eq!(result.metrics.revenue.as_deref(), Some("52,000"));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_corrupt_pdf_is_labelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let failure = DocumentExtractor::process(&path, FileKind::Pdf).unwrap_err();
        assert!(failure.message.starts_with("PDF processing failed: "));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_without_feature_is_non_fatal() {
        let failure = DocumentExtractor::process(Path::new("a.pdf"), FileKind::Pdf).unwrap_err();
        assert!(failure.message.contains("not available"));
    }
}
