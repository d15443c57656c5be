//! Local language model client
//!
//! Talks to an Ollama-compatible `/api/chat` endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::AppConfig;
use crate::error::QaError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling options, serialized with Ollama's option names
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    #[serde(rename = "num_predict")]
    pub max_new_tokens: u32,
    #[serde(rename = "repeat_penalty")]
    pub repetition_penalty: f32,
}

impl SamplingOptions {
    /// Low temperature, short answers, discouraged repetition
    pub const FINANCIAL_QA: SamplingOptions = SamplingOptions {
        temperature: 0.2,
        top_p: 0.9,
        max_new_tokens: 150,
        repetition_penalty: 1.3,
    };
}

/// Chat-completion seam; the dispatcher only depends on this trait
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<SamplingOptions>,
    ) -> crate::Result<String>;
}

/// Reusable Ollama client (connection-pooled)
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        Self::new(
            config.ollama_base_url.clone(),
            config.model_name.clone(),
            config.model_timeout,
        )
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<SamplingOptions>,
    ) -> crate::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options,
        };

        debug!(model = %self.model, messages = messages.len(), "Calling model server");

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Model request failed: {}", e);
                QaError::LlmError(format!("Model server unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Model server error response ({}): {}", status, error_text);
            return Err(QaError::LlmError(format!(
                "Model server returned {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse model response: {}", e);
            QaError::LlmError(format!("Model response parse error: {}", e))
        })?;

        info!(
            model = %self.model,
            eval_count = chat_response.eval_count.unwrap_or(0),
            "Model response received"
        );

        Ok(chat_response.message.content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SamplingOptions>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::user("What is the total revenue?")];
        let request = ChatRequest {
            model: "qwen2:0.5b",
            messages: &messages,
            stream: false,
            options: Some(SamplingOptions::FINANCIAL_QA),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "qwen2:0.5b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "What is the total revenue?");
        assert_eq!(json["options"]["num_predict"], 150);
        assert!(json["options"]["repeat_penalty"].is_number());
    }

    #[test]
    fn test_options_omitted_for_probe() {
        let messages = vec![ChatMessage::user("Hello")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            stream: false,
            options: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("options"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"model":"qwen2:0.5b","message":{"role":"assistant","content":" Revenue is $52,000. "},"done":true,"eval_count":12}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.role, Role::Assistant);
        assert_eq!(parsed.eval_count, Some(12));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_llm_error() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let client = OllamaClient::new("http://127.0.0.1:9", "m", Duration::from_secs(2)).unwrap();
        let err = client.chat(&[ChatMessage::user("Hello")], None).await.unwrap_err();
        assert!(matches!(err, QaError::LlmError(_)));
    }
}
