//! Session state
//!
//! Owns the currently loaded document and the chat log. Every user action
//! (upload, question, clear) goes through a `Session`.

use crate::config::AppConfig;
use crate::context::build_context;
use crate::error::{QaError, ValidationError};
use crate::extraction::DocumentExtractor;
use crate::llm::{LanguageModel, OllamaClient};
use crate::models::{ChatTurn, ExtractionResult, ValidatedUpload};
use crate::qa::QuestionDispatcher;
use crate::validation::FileValidator;
use crate::Result;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// A processed upload
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub upload: ValidatedUpload,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub fingerprint: String,
    pub result: ExtractionResult,
}

pub struct Session {
    validator: FileValidator,
    dispatcher: QuestionDispatcher,
    document: Option<LoadedDocument>,
    chat_log: Vec<ChatTurn>,
    documents_processed: usize,
}

impl Session {
    pub fn new(dispatcher: QuestionDispatcher, validator: FileValidator) -> Self {
        Self {
            validator,
            dispatcher,
            document: None,
            chat_log: Vec::new(),
            documents_processed: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(OllamaClient::from_config(config)?);
        Ok(Self::new(
            QuestionDispatcher::new(model),
            FileValidator::with_max_size(config.max_upload_bytes),
        ))
    }

    pub fn validate(&self, name: &str, size: u64) -> std::result::Result<ValidatedUpload, ValidationError> {
        self.validator.validate(name, size)
    }

    /// Validate, extract and install a document. On success the previous
    /// document is replaced entirely; on failure it is left in place.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<&LoadedDocument> {
        let upload = self.validate(name, bytes.len() as u64)?;
        let fingerprint = hex::encode(Sha256::digest(bytes));

        let mut temp = tempfile::Builder::new()
            .prefix("docqa-")
            .suffix(&format!(".{}", upload.extension))
            .tempfile()?;
        temp.write_all(bytes)?;
        temp.flush()?;

        let outcome = DocumentExtractor::process(temp.path(), upload.kind);

        if let Err(e) = temp.close() {
            debug!("Failed to remove temporary upload: {}", e);
        }

        let result = outcome.map_err(|failure| QaError::ExtractionError(failure.message))?;

        info!(
            name = %upload.name,
            kind = %upload.kind,
            fingerprint = %fingerprint,
            "Document loaded"
        );

        self.documents_processed += 1;
        Ok(self.document.insert(LoadedDocument {
            upload,
            fingerprint,
            result,
        }))
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    /// Model context for the loaded document, rebuilt on each call
    pub fn context(&self) -> Option<String> {
        self.document.as_ref().map(|doc| build_context(&doc.result))
    }

    pub async fn ask(&mut self, question: &str) -> Result<&ChatTurn> {
        let document = self.document.as_ref().ok_or(QaError::NoDocument)?;

        let answer = self.dispatcher.answer(question, &document.result).await;
        info!(model_backed = answer.model_backed, "Question answered");

        self.chat_log
            .push(ChatTurn::new(question, answer.text, answer.model_backed));
        Ok(&self.chat_log[self.chat_log.len() - 1])
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.chat_log
    }

    pub fn clear_history(&mut self) {
        info!(turns = self.chat_log.len(), "Clearing chat history");
        self.chat_log.clear();
    }

    pub fn documents_processed(&self) -> usize {
        self.documents_processed
    }

    pub fn dispatcher(&self) -> &QuestionDispatcher {
        &self.dispatcher
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.validator.max_size()
    }
}
