//! Runtime configuration
//!
//! Read from the process environment (after `.env` is loaded by the binaries).

use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "qwen2:0.5b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;
pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Ollama-compatible model server
    pub ollama_base_url: String,
    pub model_name: String,
    pub max_upload_bytes: u64,
    pub port: u16,
    pub model_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            port: DEFAULT_PORT,
            model_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ollama_base_url = env::var("OLLAMA_BASE_URL")
            .or_else(|_| env::var("OLLAMA_HOST"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.ollama_base_url);

        let model_name = env::var("OLLAMA_MODEL").unwrap_or(defaults.model_name);

        let max_upload_bytes = upload_bytes(parse_var("MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB));

        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .ok()
            .and_then(|raw| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("Ignoring invalid port {:?}, using {}", raw, DEFAULT_PORT);
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let timeout_secs = parse_var("OLLAMA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self {
            ollama_base_url,
            model_name,
            max_upload_bytes,
            port,
            model_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn max_upload_mb(&self) -> u64 {
        self.max_upload_bytes / (1024 * 1024)
    }
}

/// Megabytes to bytes; a value that does not fit falls back to the default
fn upload_bytes(mb: u64) -> u64 {
    mb.checked_mul(1024 * 1024).unwrap_or_else(|| {
        warn!(
            "Ignoring oversized MAX_UPLOAD_MB={}, using {}",
            mb, DEFAULT_MAX_UPLOAD_MB
        );
        DEFAULT_MAX_UPLOAD_MB * 1024 * 1024
    })
}

fn parse_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
