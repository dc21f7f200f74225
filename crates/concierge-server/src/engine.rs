use crate::config::ConciergeConfig;
use concierge_core::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Store type shared by the engine and the health endpoint.
pub type SharedStore = MessageStore<Arc<dyn MessageSource>>;

#[derive(Clone)]
pub struct Engine {
    pub answer: Arc<dyn AnswerEngine>,
    pub store: Arc<SharedStore>,
}

impl Engine {
    /// Wire an engine of the given strategy around an existing store.
    pub fn with_store(
        config: &ConciergeConfig,
        strategy: Strategy,
        store: Arc<SharedStore>,
    ) -> anyhow::Result<Self> {
        let answer: Arc<dyn AnswerEngine> = match strategy {
            Strategy::Llm => {
                let client = OpenAiClient::new(config.completion_config())?;
                if !client.is_configured() {
                    warn!(
                        "No completion API key found; set {} to enable answers",
                        crate::config::API_KEY_ENV
                    );
                }
                let context = ContextBuilder::new(config.engine.max_messages_per_member);
                Arc::new(LlmEngine::new(store.clone(), client).with_context_builder(context))
            }
            Strategy::Local => Arc::new(LocalEngine::new(store.clone())?),
        };

        Ok(Self { answer, store })
    }
}

/// Build the engine described by `config`, optionally overriding its strategy.
pub fn build(config: &ConciergeConfig, strategy: Option<Strategy>) -> anyhow::Result<Engine> {
    let strategy = strategy.unwrap_or(config.engine.strategy);
    let source: Arc<dyn MessageSource> = Arc::new(HttpMessageSource::new(config.source_config())?);
    let store = Arc::new(MessageStore::with_ttl(source, config.cache_ttl()));

    info!(
        "Engine: strategy={}, upstream={}, cache ttl={}s",
        strategy, config.upstream.base_url, config.store.cache_ttl_secs
    );
    Engine::with_store(config, strategy, store)
}
