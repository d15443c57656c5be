//! PDF text extraction via lopdf

use crate::extraction::metrics;
use crate::models::{DocumentBody, ExtractionResult, FinancialMetrics};
use crate::Result;
use chrono::Utc;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Text of each page, in page order
pub fn read_pages(path: &Path) -> Result<Vec<String>> {
    let document = Document::load(path)?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    page_texts(&document, &page_numbers)
}

/// Any page that cannot be decoded fails the whole document
fn page_texts(document: &Document, page_numbers: &[u32]) -> Result<Vec<String>> {
    let mut texts = Vec::with_capacity(page_numbers.len());
    for &page_number in page_numbers {
        let text = document.extract_text(&[page_number]).map_err(|e| {
            warn!(page = page_number, "Failed to extract page text: {}", e);
            e
        })?;
        debug!(page = page_number, chars = text.len(), "Extracted page");
        texts.push(text);
    }

    Ok(texts)
}

pub fn analyze_pages(pages: Vec<String>) -> ExtractionResult {
    let page_count = pages.len();
    let text = pages.join("\n");

    let mut financial_metrics = FinancialMetrics::default();
    metrics::scan_text_metrics(&text, &mut financial_metrics);

    ExtractionResult {
        text,
        body: DocumentBody::Pdf { page_count },
        tables: Vec::new(),
        metrics: financial_metrics,
        extracted_at: Utc::now(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_joined_in_order() {
        let result = analyze_pages(vec![
            "Joe's Motorbike Tyres".to_string(),
            "Revenue: $52,000".to_string(),
            "Net income: $5,200".to_string(),
        ]);

        assert_eq!(result.page_count(), Some(3));
        assert_eq!(
            result.text,
            "Joe's Motorbike Tyres\nRevenue: $52,000\nNet income: $5,200"
        );
        assert_eq!(result.metrics.revenue.as_deref(), Some("52,000"));
        assert_eq!(result.metrics.profit.as_deref(), Some("5,200"));
        assert!(result.tables.is_empty());
    }

    #[test]
    fn test_read_pages_from_file() {
        let bytes = fixtures::pdf_with_pages(&["Revenue: $52,000", "Profit: $10,000"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, bytes).unwrap();

        let pages = read_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Revenue"));
        assert!(pages[1].contains("Profit"));
    }

    #[test]
    fn test_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-garbage").unwrap();

        assert!(read_pages(&path).is_err());
    }

    #[test]
    fn test_undecodable_page_fails_document() {
        let bytes = fixtures::pdf_with_pages(&["Revenue: $52,000"]);
        let document = Document::load_mem(&bytes).unwrap();

        assert_eq!(page_texts(&document, &[1]).unwrap().len(), 1);
        assert!(page_texts(&document, &[1, 2]).is_err());
    }
}
