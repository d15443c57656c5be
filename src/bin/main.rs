//! Command-line front end: load one document, ask questions, print answers.
//!
//! Usage: docqa <file> [question...]

use financial_doc_qa::{AppConfig, DocumentBody, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: docqa <file> [question...]");
        std::process::exit(2);
    };
    let questions: Vec<String> = args.collect();

    let config = AppConfig::from_env();
    let mut session = Session::from_config(&config)?;

    let name = std::path::Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());
    let bytes = std::fs::read(&path)?;

    info!(path = %path, "Loading document");

    let doc = match session.upload(&name, &bytes) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== {} ({}) ===", doc.upload.name, doc.upload.kind);
    println!("Size: {:.1} KB", doc.upload.size as f64 / 1024.0);
    match &doc.result.body {
        DocumentBody::Spreadsheet { sheets } => {
            println!("Sheets: {}", sheets.len());
            for sheet in sheets {
                println!(
                    "  - {} ({} rows x {} columns)",
                    sheet.name,
                    sheet.row_count(),
                    sheet.column_count()
                );
            }
            println!("Financial tables found: {}", doc.result.tables.len());
            for table in &doc.result.tables {
                println!("  - {}: {}", table.sheet_name, table.kind);
            }
        }
        DocumentBody::Pdf { page_count } => {
            println!("Pages: {}", page_count);
            println!("Text length: {} characters", doc.result.text_len());
            println!("\n{}", doc.result.text_preview());
        }
    }

    if !doc.result.metrics.is_empty() {
        println!("\nKey metrics:");
        for (metric, value) in doc.result.metrics.iter() {
            println!("  {}: {}", metric, value);
        }
    }

    if questions.is_empty() {
        return Ok(());
    }

    let mode = if session.dispatcher().is_model_available().await {
        format!("model {}", session.dispatcher().model_name())
    } else {
        "pattern matching".to_string()
    };
    println!("\nAnswering with {}", mode);

    for question in questions {
        let turn = session.ask(&question).await?;
        println!("\nQ: {}\nA: {}", turn.question, turn.answer);
    }

    Ok(())
}
