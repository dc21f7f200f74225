use crate::types::MessageBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct CachedBatch {
    pub batch: Arc<MessageBatch>,
    pub fetched_at: Instant,
    pub fetched_at_utc: DateTime<Utc>,
}

/// Single-slot cache for the upstream feed.
pub struct BatchCache {
    entry: Option<CachedBatch>,
    ttl: Duration,
}

impl BatchCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Return the cached batch if it is non-empty and younger than the TTL.
    pub fn get(&self) -> Option<Arc<MessageBatch>> {
        self.entry.as_ref().and_then(|e| {
            if !e.batch.is_empty() && e.fetched_at.elapsed() < self.ttl {
                Some(e.batch.clone())
            } else {
                None
            }
        })
    }

    /// Replace the slot. Whatever was there is dropped.
    pub fn put(&mut self, batch: Arc<MessageBatch>, fetched_at: Instant) {
        self.entry = Some(CachedBatch {
            batch,
            fetched_at,
            fetched_at_utc: Utc::now(),
        });
    }

    pub fn is_populated(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| !e.batch.is_empty())
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|e| e.fetched_at_utc)
    }
}
