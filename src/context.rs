//! Model context assembly

use crate::models::ExtractionResult;

const PREAMBLE: &str = "Financial Document Content:\n\n";
const METRICS_HEADER: &str = "\n\nExtracted Financial Metrics:\n";

/// Document text followed by a metrics trailer when any metric was found.
/// Recomputed on every call.
pub fn build_context(result: &ExtractionResult) -> String {
    let mut context = String::with_capacity(PREAMBLE.len() + result.text.len() + 128);
    context.push_str(PREAMBLE);
    context.push_str(&result.text);

    if !result.metrics.is_empty() {
        context.push_str(METRICS_HEADER);
        for (name, value) in result.metrics.iter() {
            context.push_str(&format!("- {}: {}\n", name, value));
        }
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentBody, FinancialMetrics};
    use chrono::Utc;

    fn result(text: &str, metrics: FinancialMetrics) -> ExtractionResult {
        ExtractionResult {
            text: text.to_string(),
            body: DocumentBody::Pdf { page_count: 1 },
            tables: vec![],
            metrics,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_without_metrics() {
        let context = build_context(&result("hello", FinancialMetrics::default()));
        assert_eq!(context, "Financial Document Content:\n\nhello");
    }

    #[test]
    fn test_with_metrics_trailer() {
        let metrics = FinancialMetrics {
            revenue: Some("52,000".into()),
            profit: Some("5,200".into()),
            ..Default::default()
        };
        let context = build_context(&result("Revenue: $52,000", metrics));

        assert_eq!(
            context,
            "Financial Document Content:\n\nRevenue: $52,000\n\n\
             Extracted Financial Metrics:\n- revenue: 52,000\n- profit: 5,200\n"
        );
    }
}
