//! Core data models for document extraction and Q&A

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Uploads =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Excel,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "excel",
        }
    }
}

/// Metadata echoed back by a successful validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub kind: FileKind,
    pub extension: String,
    pub size: u64,
    pub name: String,
}

//
// ================= Tables =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlowStatement,
    Generic,
}

/// Cell contents of one worksheet; the first row is the header row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Data rows, header excluded
    pub fn records(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.records().len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Copy of the header plus the first `n` data rows
    pub fn head(&self, n: usize) -> SheetData {
        SheetData {
            name: self.name.clone(),
            rows: self.rows.iter().take(n + 1).cloned().collect(),
        }
    }

    /// Plain-text table: header line, then each record prefixed by its
    /// 0-based index, every column right-aligned to its widest cell.
    pub fn render(&self) -> String {
        let columns = self.column_count();
        if columns == 0 {
            return "Empty sheet".to_string();
        }

        let cell = |row: &Vec<String>, col: usize| -> String {
            row.get(col).map(|s| s.trim().to_string()).unwrap_or_default()
        };

        let index_width = self.row_count().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| cell(row, col).chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows.len());

        let header = self.rows.first().cloned().unwrap_or_default();
        let mut line = " ".repeat(index_width);
        for (col, width) in widths.iter().enumerate() {
            line.push_str(&format!("  {:>width$}", cell(&header, col), width = *width));
        }
        lines.push(line.trim_end().to_string());

        for (index, row) in self.records().iter().enumerate() {
            let mut line = format!("{:>width$}", index, width = index_width);
            for (col, width) in widths.iter().enumerate() {
                line.push_str(&format!("  {:>width$}", cell(row, col), width = *width));
            }
            lines.push(line.trim_end().to_string());
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTable {
    pub sheet_name: String,
    pub kind: StatementKind,
    pub data: SheetData,
}

//
// ================= Metrics =================
//

/// Metrics pulled out of a document. Each field is optional; a missing
/// value means the document did not mention it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_sheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_sheet: Option<String>,
}

impl FinancialMetrics {
    pub const NAMES: [&'static str; 4] = ["revenue", "profit", "revenue_sheet", "profit_sheet"];

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            "revenue" => self.revenue.as_deref(),
            "profit" => self.profit.as_deref(),
            "revenue_sheet" => self.revenue_sheet.as_deref(),
            "profit_sheet" => self.profit_sheet.as_deref(),
            _ => None,
        }
    }

    /// Present metrics in fixed vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        Self::NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|value| (*name, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

//
// ================= Extraction =================
//

/// Format-specific part of an extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentBody {
    Spreadsheet { sheets: Vec<SheetData> },
    Pdf { page_count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub body: DocumentBody,
    pub tables: Vec<FinancialTable>,
    pub metrics: FinancialMetrics,
    pub extracted_at: DateTime<Utc>,
}

const PREVIEW_CHARS: usize = 500;

impl ExtractionResult {
    pub fn kind(&self) -> FileKind {
        match self.body {
            DocumentBody::Spreadsheet { .. } => FileKind::Excel,
            DocumentBody::Pdf { .. } => FileKind::Pdf,
        }
    }

    pub fn sheets(&self) -> &[SheetData] {
        match &self.body {
            DocumentBody::Spreadsheet { sheets } => sheets,
            DocumentBody::Pdf { .. } => &[],
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets().iter().map(|s| s.name.as_str()).collect()
    }

    pub fn page_count(&self) -> Option<usize> {
        match self.body {
            DocumentBody::Pdf { page_count } => Some(page_count),
            DocumentBody::Spreadsheet { .. } => None,
        }
    }

    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn text_preview(&self) -> String {
        if self.text_len() > PREVIEW_CHARS {
            let head: String = self.text.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.text.clone()
        }
    }
}

/// Labelled, displayable extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub message: String,
}

impl ExtractionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type ExtractionOutcome = std::result::Result<ExtractionResult, ExtractionFailure>;

//
// ================= Chat =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub turn_id: Uuid,
    pub question: String,
    pub answer: String,
    /// Answered by the language model rather than the keyword fallback
    pub model_backed: bool,
    pub asked_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, model_backed: bool) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            model_backed,
            asked_at: Utc::now(),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::IncomeStatement => "Income Statement",
            StatementKind::CashFlowStatement => "Cash Flow Statement",
            StatementKind::Generic => "Financial Statement",
        };
        write!(f, "{}", s)
    }
}
