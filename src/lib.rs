//! Financial Document Q&A
//!
//! Loads a spreadsheet or PDF financial document, extracts its text and
//! headline metrics, and answers natural-language questions about it.
//!
//! FLOW:
//! UPLOAD → VALIDATE → EXTRACT → CONTEXT → ASK → (MODEL | FALLBACK) → CHAT LOG

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod qa;
pub mod session;
pub mod validation;

pub use error::{QaError, Result};

// Re-export common types
pub use config::AppConfig;
pub use extraction::DocumentExtractor;
pub use models::*;
pub use qa::{Answer, QuestionDispatcher};
pub use session::{LoadedDocument, Session};
pub use validation::FileValidator;
