//! Chat-completion backends used by the LLM answer strategy.

pub mod openai;

pub use openai::{CompletionConfig, OpenAiClient};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// One system instruction followed by one user turn.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// First choice's text, trimmed.
    pub content: String,
    /// Usage object as returned by the service, untouched.
    pub usage: Option<Value>,
    pub model: String,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Whether a credential is available. An unconfigured client fails every
    /// call with `NotConfigured` without touching the network.
    fn is_configured(&self) -> bool;

    /// Exactly one request/response exchange. No retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        (**self).complete(request).await
    }
}
