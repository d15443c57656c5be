//! Question answering
//!
//! Two strategies, picked per question by model availability:
//! - Model-backed: known-answer lookup, then prompt → model → cleanup → plausibility checks
//! - Fallback: ordered keyword rules over the raw document text

pub mod availability;
pub mod fallback;
pub mod known_answers;
pub mod postprocess;

pub use availability::ModelAvailability;
pub use fallback::{FallbackAnswerer, FallbackCategory};
pub use known_answers::{KnownAnswerTable, KnownIntent};
pub use postprocess::{create_default_plausibility_filter, PlausibilityFilter};

use crate::context::build_context;
use crate::llm::{ChatMessage, LanguageModel, SamplingOptions};
use crate::models::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Characters of document context included in a prompt
pub const PROMPT_CONTEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model_backed: bool,
}

pub struct QuestionDispatcher {
    model: Arc<dyn LanguageModel>,
    availability: ModelAvailability,
    known_answers: KnownAnswerTable,
    plausibility: PlausibilityFilter,
    options: SamplingOptions,
}

impl QuestionDispatcher {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            availability: ModelAvailability::new(),
            known_answers: KnownAnswerTable::sample_statement(),
            plausibility: create_default_plausibility_filter(),
            options: SamplingOptions::FINANCIAL_QA,
        }
    }

    pub fn with_known_answers(mut self, known_answers: KnownAnswerTable) -> Self {
        self.known_answers = known_answers;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn is_model_available(&self) -> bool {
        self.availability.check(self.model.as_ref()).await
    }

    /// Drop the cached availability and probe again
    pub async fn refresh_availability(&self) -> bool {
        self.availability.invalidate().await;
        self.is_model_available().await
    }

    pub async fn answer(&self, question: &str, document: &ExtractionResult) -> Answer {
        if self.is_model_available().await {
            let context = build_context(document);
            Answer {
                text: self.answer_with_model(question, &context).await,
                model_backed: true,
            }
        } else {
            info!("Model unavailable, answering with keyword fallback");
            Answer {
                text: answer_with_fallback(question, &document.text),
                model_backed: false,
            }
        }
    }

    /// Model-backed strategy. Never fails: a model error becomes the answer text.
    pub async fn answer_with_model(&self, question: &str, context: &str) -> String {
        if let Some(known) = self.known_answers.lookup(question, context) {
            info!(intent = ?known.intent, "Answered from known-answer table");
            return postprocess::clean_response(&known.answer);
        }

        let prompt = build_prompt(question, context);
        let messages = [ChatMessage::user(prompt)];

        match self.model.chat(&messages, Some(self.options)).await {
            Ok(reply) => {
                let answer = postprocess::clean_response(&reply);
                let answer = postprocess::repair_template_artifacts(&answer, question, context);
                self.plausibility.apply(answer, context)
            }
            Err(e) => {
                warn!("Model call failed: {}", e);
                self.availability.invalidate().await;
                format!("❌ Error processing question: {}", e)
            }
        }
    }
}

pub fn answer_with_fallback(question: &str, document_text: &str) -> String {
    FallbackAnswerer::new(document_text).answer(question)
}

pub fn build_prompt(question: &str, context: &str) -> String {
    let excerpt: String = context.chars().take(PROMPT_CONTEXT_CHARS).collect();

    format!(
        "Based on this financial document, answer the question directly and concisely.\n\n\
         DOCUMENT DATA:\n{}\n\n\
         QUESTION: {}\n\n\
         Give a direct answer in one clear sentence. If you find a specific number, include it. \
         If information is missing, say \"Information not available in document.\"\n\n\
         ANSWER:",
        excerpt, question
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::QaError;
    use crate::llm::{ChatMessage, LanguageModel, SamplingOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-process model returning a fixed reply and recording prompts
    pub struct ScriptedModel {
        reply: Result<String, String>,
        /// Calls answered with `warmup_reply` before `reply` takes over
        warmup: usize,
        warmup_reply: String,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                warmup: 0,
                warmup_reply: String::new(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: &str) -> Self {
            Self {
                reply: Err(error.to_string()),
                warmup: 0,
                warmup_reply: String::new(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Replies normally for the first `calls` calls, then fails
        pub fn failing_after(calls: usize, reply: &str, error: &str) -> Self {
            Self {
                warmup: calls,
                warmup_reply: reply.to_string(),
                ..Self::failing(error)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: Option<SamplingOptions>,
        ) -> crate::Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(last) = messages.last() {
                self.prompts.lock().unwrap().push(last.content.clone());
            }
            if call < self.warmup {
                return Ok(self.warmup_reply.clone());
            }
            self.reply.clone().map_err(QaError::LlmError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::models::{DocumentBody, FinancialMetrics};
    use chrono::Utc;

    fn document(text: &str) -> ExtractionResult {
        ExtractionResult {
            text: text.to_string(),
            body: DocumentBody::Pdf { page_count: 1 },
            tables: vec![],
            metrics: FinancialMetrics::default(),
            extracted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_known_answer_skips_model() {
        let model = Arc::new(ScriptedModel::replying("Revenue is about 3 million"));
        let dispatcher = QuestionDispatcher::new(model.clone());

        let answer = dispatcher
            .answer_with_model("What is the revenue?", "Joe's Motorbike Tyres ledger")
            .await;

        assert_eq!(
            answer,
            "The total sales revenue is $52,000 based on 1,000 tyres sold at $52 each."
        );
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_reply_is_cleaned_and_checked() {
        let model = Arc::new(ScriptedModel::replying("Cash on hand is 9,000dollars"));
        let dispatcher = QuestionDispatcher::new(model.clone());

        let answer = dispatcher
            .answer_with_model("How much cash?", "Cash 9,000")
            .await;
        assert_eq!(answer, "Cash on hand is 9,000 dollars");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("QUESTION: How much cash?"));
        assert!(prompts[0].ends_with("ANSWER:"));
    }

    #[tokio::test]
    async fn test_suspicious_reply_flagged() {
        let model = Arc::new(ScriptedModel::replying("Debt is estimated at 2 billion"));
        let dispatcher = QuestionDispatcher::new(model);

        let answer = dispatcher.answer_with_model("What is the debt?", "Debt 400").await;
        assert!(answer.starts_with("⚠️ VALIDATION WARNING"));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_answer() {
        let model = Arc::new(ScriptedModel::failing("connection refused"));
        let dispatcher = QuestionDispatcher::new(model).with_known_answers(KnownAnswerTable::empty());

        let answer = dispatcher.answer_with_model("What is the revenue?", "joe").await;
        assert!(answer.starts_with("❌ Error processing question: "));
        assert!(answer.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_model_failure_invalidates_availability() {
        let model = Arc::new(ScriptedModel::failing_after(1, "pong", "connection refused"));
        let dispatcher = QuestionDispatcher::new(model.clone());

        assert!(dispatcher.is_model_available().await);
        assert_eq!(model.calls(), 1);

        let answer = dispatcher.answer_with_model("How much cash?", "Cash 9,000").await;
        assert!(answer.starts_with("❌ Error processing question: "));
        assert_eq!(dispatcher.availability.cached().await, None);

        // Next check probes again instead of trusting the stale flag
        assert!(!dispatcher.is_model_available().await);
        assert_eq!(model.calls(), 3);
        assert!(!dispatcher.is_model_available().await);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_model_uses_fallback() {
        let model = Arc::new(ScriptedModel::failing("down"));
        let dispatcher = QuestionDispatcher::new(model.clone());

        let answer = dispatcher
            .answer("What was the profit?", &document("Profit: $10,000"))
            .await;

        assert!(!answer.model_backed);
        assert!(answer.text.contains("10,000"));
        // Only the availability probe reached the model
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_available_model_is_probed_once() {
        let model = Arc::new(ScriptedModel::replying("Assets total 9,000."));
        let dispatcher = QuestionDispatcher::new(model.clone());
        let doc = document("Total assets 9,000");

        let first = dispatcher.answer("What are the assets?", &doc).await;
        let second = dispatcher.answer("And the assets again?", &doc).await;

        assert!(first.model_backed && second.model_backed);
        assert_eq!(first.text, "Assets total 9,000.");
        // One probe plus two questions
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn test_prompt_truncates_context() {
        let context = "a".repeat(PROMPT_CONTEXT_CHARS + 500);
        let prompt = build_prompt("q?", &context);

        assert!(prompt.contains(&"a".repeat(PROMPT_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"a".repeat(PROMPT_CONTEXT_CHARS + 1)));
    }
}
