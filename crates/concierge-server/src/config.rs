use concierge_core::completion::openai::{DEFAULT_COMPLETION_URL, DEFAULT_MODEL};
use concierge_core::context::DEFAULT_MAX_MESSAGES_PER_MEMBER;
use concierge_core::store::http::DEFAULT_UPSTREAM_URL;
use concierge_core::{CompletionConfig, SourceConfig, Strategy};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Contents of `concierge.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConciergeConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub completion: CompletionTomlConfig,
    pub engine: EngineConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub fetch_timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.into(),
            fetch_timeout_secs: 30,
            probe_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionTomlConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Prefer the `OPENAI_API_KEY` environment variable; it wins when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for CompletionTomlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.into(),
            model: DEFAULT_MODEL.into(),
            max_tokens: 800,
            temperature: 0.5,
            timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: Strategy,
    pub max_messages_per_member: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Llm,
            max_messages_per_member: DEFAULT_MAX_MESSAGES_PER_MEMBER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub cache_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 600 }
    }
}

impl ConciergeConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Defaults when the file is missing. A file that exists but fails to
    /// parse is reported and then ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Human-readable problems, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.server.listen.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "[server] listen '{}' is not a valid socket address",
                self.server.listen
            ));
        }
        for (section, url) in [
            ("upstream", &self.upstream.base_url),
            ("completion", &self.completion.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("[{}] base_url '{}' must start with http:// or https://", section, url));
            }
        }
        if self.upstream.fetch_timeout_secs == 0 || self.upstream.probe_timeout_secs == 0 {
            errors.push("[upstream] timeouts must be greater than 0".into());
        }
        if self.completion.timeout_secs == 0 {
            errors.push("[completion] timeout_secs must be greater than 0".into());
        }
        if self.completion.model.trim().is_empty() {
            errors.push("[completion] model must not be empty".into());
        }
        if self.completion.max_tokens == 0 {
            errors.push("[completion] max_tokens must be greater than 0".into());
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            errors.push(format!(
                "[completion] temperature {} must be within 0.0..=2.0",
                self.completion.temperature
            ));
        }
        if self.engine.max_messages_per_member == 0 {
            errors.push("[engine] max_messages_per_member must be greater than 0".into());
        }

        errors
    }

    /// API key from the environment, falling back to `[completion] api_key`.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.completion.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", self.server.listen, e))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.store.cache_ttl_secs)
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig::new(self.upstream.base_url.clone())
            .with_fetch_timeout(Duration::from_secs(self.upstream.fetch_timeout_secs))
            .with_probe_timeout(Duration::from_secs(self.upstream.probe_timeout_secs))
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig::default()
            .with_base_url(self.completion.base_url.clone())
            .with_model(self.completion.model.clone())
            .with_max_tokens(self.completion.max_tokens)
            .with_temperature(self.completion.temperature)
            .with_timeout(Duration::from_secs(self.completion.timeout_secs))
            .with_api_key(self.resolved_api_key())
    }
}
