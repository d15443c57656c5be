//! Workbook extraction (xlsx / xls / xlsm) via calamine

use crate::extraction::metrics;
use crate::models::{DocumentBody, ExtractionResult, FinancialMetrics, FinancialTable, SheetData};
use crate::Result;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::Utc;
use std::path::Path;
use tracing::debug;

/// Read every worksheet in workbook order as rows of display strings
pub fn read_workbook(path: &Path) -> Result<Vec<SheetData>> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        debug!(sheet = %name, rows = rows.len(), "Loaded worksheet");
        sheets.push(SheetData::new(name, rows));
    }

    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Build the extraction result for a set of loaded sheets
pub fn analyze_sheets(sheets: Vec<SheetData>) -> ExtractionResult {
    let mut text = String::new();
    let mut tables = Vec::new();

    for sheet in &sheets {
        let rendered = sheet.render();

        if metrics::contains_financial_keywords(&rendered) {
            tables.push(FinancialTable {
                sheet_name: sheet.name.clone(),
                kind: metrics::classify_statement(&rendered),
                data: sheet.clone(),
            });
        }

        text.push_str(&format!("\n\n--- Sheet: {} ---\n", sheet.name));
        text.push_str(&rendered);
    }

    let mut financial_metrics = FinancialMetrics::default();
    metrics::scan_sheet_metrics(&sheets, &mut financial_metrics);
    metrics::scan_text_metrics(&text, &mut financial_metrics);

    ExtractionResult {
        text,
        body: DocumentBody::Spreadsheet { sheets },
        tables,
        metrics: financial_metrics,
        extracted_at: Utc::now(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_xlsxwriter::Workbook;

    /// xlsx bytes with one worksheet per `(name, rows)` entry, all cells as strings
    pub fn xlsx_with_sheets(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).expect("sheet name");
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    worksheet
                        .write_string(r as u32, c as u16, *value)
                        .expect("write cell");
                }
            }
        }
        workbook.save_to_buffer().expect("save workbook")
    }
}
