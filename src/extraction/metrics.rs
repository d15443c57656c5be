//! Keyword and regex scans over extracted text

use crate::models::{FinancialMetrics, SheetData, StatementKind};
use lazy_static::lazy_static;
use regex::Regex;

/// Words that mark a sheet as holding financial data
const FINANCIAL_KEYWORDS: &[&str] = &[
    "revenue", "income", "profit", "loss", "expense", "cost",
    "sales", "earnings", "ebitda", "assets", "liabilities",
    "equity", "cash", "debt", "balance", "statement",
];

/// Checked in order; the first kind with any hit wins
const STATEMENT_KEYWORDS: &[(StatementKind, &[&str])] = &[
    (StatementKind::BalanceSheet, &["balance sheet", "assets", "liabilities"]),
    (StatementKind::IncomeStatement, &["income statement", "revenue", "profit", "loss"]),
    (StatementKind::CashFlowStatement, &["cash flow", "operating", "investing", "financing"]),
];

/// Optional `$`, thousands-separated integer part, optional cents
const AMOUNT: &str = r"\$?(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)";

lazy_static! {
    static ref REVENUE_PATTERNS: Vec<Regex> = ["revenue", "total revenue", "sales"]
        .iter()
        .map(|label| amount_pattern(label))
        .collect();

    static ref PROFIT_PATTERNS: Vec<Regex> = ["net income", "profit"]
        .iter()
        .map(|label| amount_pattern(label))
        .collect();
}

fn amount_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"{}[:\s]+{}", label, AMOUNT)).expect("static metric pattern")
}

pub fn contains_financial_keywords(text: &str) -> bool {
    let lower = text.to_lowercase();
    FINANCIAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn classify_statement(text: &str) -> StatementKind {
    let lower = text.to_lowercase();
    STATEMENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or(StatementKind::Generic)
}

/// First capture of the first matching pattern, matched against lower-cased text
fn first_capture(patterns: &[Regex], lower: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(lower))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fill `revenue` / `profit` from labelled amounts in free text
pub fn scan_text_metrics(text: &str, metrics: &mut FinancialMetrics) {
    let lower = text.to_lowercase();
    metrics.revenue = first_capture(&REVENUE_PATTERNS, &lower);
    metrics.profit = first_capture(&PROFIT_PATTERNS, &lower);
}

/// Record which sheets mention revenue and profit. Later sheets overwrite
/// earlier ones.
pub fn scan_sheet_metrics(sheets: &[SheetData], metrics: &mut FinancialMetrics) {
    for sheet in sheets {
        let lower = sheet.render().to_lowercase();

        if lower.contains("revenue") || lower.contains("sales") {
            metrics.revenue_sheet = Some(sheet.name.clone());
        }

        if lower.contains("profit") || lower.contains("net income") {
            metrics.profit_sheet = Some(sheet.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> FinancialMetrics {
        let mut metrics = FinancialMetrics::default();
        scan_text_metrics(text, &mut metrics);
        metrics
    }

    #[test]
    fn test_revenue_with_dollar_sign() {
        let metrics = scan("Joe's Motorbike Tyres\nRevenue: $52,000\n");
        assert_eq!(metrics.revenue.as_deref(), Some("52,000"));
        assert_eq!(metrics.profit, None);
    }

    #[test]
    fn test_sales_and_net_income() {
        let metrics = scan("SALES 1,250,000.50\nNet Income:   98,000");
        assert_eq!(metrics.revenue.as_deref(), Some("1,250,000.50"));
        assert_eq!(metrics.profit.as_deref(), Some("98,000"));
    }

    #[test]
    fn test_first_pattern_wins() {
        // "revenue" is tried before "sales" regardless of position in the text
        let metrics = scan("Sales: 10\nRevenue: 20\nProfit: 5\nNet income: 4");
        assert_eq!(metrics.revenue.as_deref(), Some("20"));
        assert_eq!(metrics.profit.as_deref(), Some("4"));
    }

    #[test]
    fn test_unlabelled_numbers_ignored() {
        let metrics = scan("Total 52,000 and growing");
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_statement_priority() {
        assert_eq!(
            classify_statement("Total Assets and Revenue"),
            StatementKind::BalanceSheet
        );
        assert_eq!(
            classify_statement("Revenue and operating costs"),
            StatementKind::IncomeStatement
        );
        assert_eq!(
            classify_statement("Cash Flow from investing"),
            StatementKind::CashFlowStatement
        );
        assert_eq!(classify_statement("Debt schedule"), StatementKind::Generic);
    }

    #[test]
    fn test_financial_keywords() {
        assert!(contains_financial_keywords("EBITDA by quarter"));
        assert!(!contains_financial_keywords("Staff rota\nMonday Tuesday"));
    }

    #[test]
    fn test_sheet_metrics_track_sheet_names() {
        let sheets = vec![
            SheetData::new("Summary", vec![vec!["Revenue".into(), "100".into()]]),
            SheetData::new("Notes", vec![vec!["Misc".into()]]),
            SheetData::new("P&L", vec![vec!["Net Income".into(), "9".into()]]),
        ];

        let mut metrics = FinancialMetrics::default();
        scan_sheet_metrics(&sheets, &mut metrics);

        assert_eq!(metrics.revenue_sheet.as_deref(), Some("Summary"));
        assert_eq!(metrics.profit_sheet.as_deref(), Some("P&L"));
    }
}
