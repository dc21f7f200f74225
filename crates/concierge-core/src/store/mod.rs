pub mod cache;
pub mod http;

pub use cache::BatchCache;
pub use http::{HttpMessageSource, SourceConfig};

use crate::error::{ConciergeError, Result};
use crate::types::MessageBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default validity window for a fetched batch.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Reachability of the upstream feed as seen by a lightweight probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Where message batches come from.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name (used in logs).
    fn name(&self) -> &str;

    /// Fetch one complete snapshot of the feed.
    async fn fetch(&self) -> Result<MessageBatch>;

    /// Cheap reachability check. Never returns an error.
    async fn probe(&self) -> UpstreamHealth;
}

#[async_trait]
impl<T: MessageSource + ?Sized> MessageSource for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self) -> Result<MessageBatch> {
        (**self).fetch().await
    }

    async fn probe(&self) -> UpstreamHealth {
        (**self).probe().await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub populated: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Time-bounded cache in front of a [`MessageSource`].
///
/// Concurrency contract: the lock only guards reading or replacing the cached
/// entry and is never held across a fetch. Concurrent misses each fetch from
/// the source and the last one to finish determines what stays cached.
pub struct MessageStore<S: MessageSource> {
    source: S,
    cache: Mutex<BatchCache>,
}

impl<S: MessageSource> MessageStore<S> {
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            source,
            cache: Mutex::new(BatchCache::new(ttl)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the cached batch, fetching a fresh one on miss or expiry.
    pub async fn get(&self) -> Result<Arc<MessageBatch>> {
        let cached = self.lock()?.get();
        if let Some(batch) = cached {
            log::debug!("message cache hit ({} items)", batch.len());
            return Ok(batch);
        }

        let started = Instant::now();
        log::debug!("message cache miss, fetching from {}", self.source.name());
        let batch = match self.source.fetch().await {
            Ok(batch) => Arc::new(batch),
            Err(e) => {
                log::warn!("fetch from {} failed: {}", self.source.name(), e);
                return Err(e);
            }
        };

        log::info!(
            "fetched {} messages ({} reported) in {:?}",
            batch.len(),
            batch.total,
            started.elapsed()
        );
        self.lock()?.put(batch.clone(), started);
        Ok(batch)
    }

    pub fn status(&self) -> Result<CacheStatus> {
        let cache = self.lock()?;
        Ok(CacheStatus {
            populated: cache.is_populated(),
            fetched_at: cache.fetched_at(),
        })
    }

    pub async fn probe(&self) -> UpstreamHealth {
        self.source.probe().await
    }

    fn lock(&self) -> Result<MutexGuard<'_, BatchCache>> {
        self.cache
            .lock()
            .map_err(|_| ConciergeError::Internal("message cache lock poisoned".into()))
    }
}
