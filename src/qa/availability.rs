//! Model availability flag
//!
//! The first check sends one trivial prompt; the outcome is cached until
//! [`ModelAvailability::invalidate`] is called.

use crate::llm::{ChatMessage, LanguageModel};
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct ModelAvailability {
    cached: RwLock<Option<bool>>,
}

impl ModelAvailability {
    pub fn new() -> Self {
        Self {
            cached: RwLock::new(None),
        }
    }

    pub async fn check(&self, model: &dyn LanguageModel) -> bool {
        if let Some(available) = *self.cached.read().await {
            return available;
        }

        let mut cached = self.cached.write().await;
        // Another caller may have probed while we waited for the lock
        if let Some(available) = *cached {
            return available;
        }

        let available = probe(model).await;
        *cached = Some(available);
        available
    }

    /// Last known state without probing
    pub async fn cached(&self) -> Option<bool> {
        *self.cached.read().await
    }

    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

impl Default for ModelAvailability {
    fn default() -> Self {
        Self::new()
    }
}

async fn probe(model: &dyn LanguageModel) -> bool {
    match model.chat(&[ChatMessage::user("Hello")], None).await {
        Ok(_) => {
            info!(model = model.model_name(), "Model available");
            true
        }
        Err(e) => {
            warn!(model = model.model_name(), "Model not available: {}", e);
            false
        }
    }
}
