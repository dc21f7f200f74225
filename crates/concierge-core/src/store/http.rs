use super::{MessageSource, UpstreamHealth};
use crate::error::{ConciergeError, Result};
use crate::types::MessageBatch;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://november7-730026606190.europe-west1.run.app";

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL; `/messages` is appended.
    pub base_url: String,
    /// Timeout for a full feed fetch. Default: 30s
    pub fetch_timeout: Duration,
    /// Timeout for the health probe. Default: 10s
    pub probe_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            fetch_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Upstream message feed over HTTP.
pub struct HttpMessageSource {
    client: reqwest::Client,
    config: SourceConfig,
}

impl HttpMessageSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ConciergeError::Validation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }
}

/// Sort a reqwest failure into the upstream error kinds.
fn classify(err: reqwest::Error) -> ConciergeError {
    if err.is_timeout() {
        ConciergeError::UpstreamTimeout
    } else if err.is_connect() || err.is_redirect() || err.is_request() {
        ConciergeError::UpstreamUnavailable(err.to_string())
    } else {
        ConciergeError::Upstream(err.to_string())
    }
}

#[async_trait]
impl MessageSource for HttpMessageSource {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    async fn fetch(&self) -> Result<MessageBatch> {
        let response = self.client.get(self.endpoint()).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConciergeError::Upstream(format!("HTTP {}", status)));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ConciergeError::UpstreamTimeout
            } else {
                ConciergeError::Upstream(e.to_string())
            }
        })?;

        MessageBatch::from_value(&body).ok_or_else(|| {
            ConciergeError::Upstream("unexpected payload shape (expected {total, items} or a list)".into())
        })
    }

    async fn probe(&self) -> UpstreamHealth {
        match self
            .client
            .get(self.endpoint())
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => UpstreamHealth::Healthy,
            Ok(resp) => {
                log::warn!("upstream probe returned {}", resp.status());
                UpstreamHealth::Degraded
            }
            Err(e) => {
                log::warn!("upstream probe failed: {}", e);
                UpstreamHealth::Unhealthy
            }
        }
    }
}
