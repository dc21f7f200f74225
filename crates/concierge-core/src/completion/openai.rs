use super::{Completion, CompletionClient, CompletionRequest};
use crate::error::{ConciergeError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const INVALID_RESPONSE: &str = "Invalid response from AI service";

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL; `/v1/chat/completions` is appended unless already present.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Default: 30s
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 800,
            temperature: 0.5,
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

impl CompletionConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Empty keys count as missing.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// OpenAI-compatible chat completions over HTTP.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ConciergeError::Validation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.config.model,
            "messages": request.messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }
}

fn parse_completion(text: &str, model: &str) -> Result<Completion> {
    let json: Value = serde_json::from_str(text)
        .map_err(|_| ConciergeError::Completion(INVALID_RESPONSE.to_string()))?;

    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| ConciergeError::Completion(INVALID_RESPONSE.to_string()))?;

    Ok(Completion {
        content: content.trim().to_string(),
        usage: json.get("usage").cloned(),
        model: model.to_string(),
    })
}

fn classify(err: reqwest::Error) -> ConciergeError {
    if err.is_timeout() {
        ConciergeError::CompletionTimeout
    } else {
        ConciergeError::Completion(format!("Error calling AI service: {}", err))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ConciergeError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("completion service returned {}", status);
            return Err(match status.as_u16() {
                401 => ConciergeError::Auth,
                429 => ConciergeError::RateLimited,
                code => ConciergeError::Completion(format!("AI service error: {}", code)),
            });
        }

        let text = response.text().await.map_err(classify)?;
        parse_completion(&text, &self.config.model)
    }
}
