//! Error types for the document Q&A pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("No document loaded")]
    NoDocument,

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Upload rejections, displayed to the user verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File too large. Max size: {max_mb}MB")]
    TooLarge { size: u64, max_mb: u64 },

    #[error("Unsupported format. Supported: {supported}")]
    UnsupportedFormat { extension: String, supported: String },
}
