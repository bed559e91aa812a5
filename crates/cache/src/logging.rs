//! Observability decorator for artifact caches
//!
//! Wraps any cache handle and records every operation as a started/finished
//! pair on the event bus plus a `tracing` record. Results pass through untouched.

use crate::errors::Result;
use crate::traits::{ArtifactCache, CacheHandle, CacheResult};
use stash_core::{CacheEvent, EventBus, FetchOutcome, RuleKey};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Cache wrapper that reports every operation
pub struct LoggingArtifactCache {
    /// Underlying cache implementation
    inner: CacheHandle,
    /// Bus the lifecycle events go to
    events: Arc<EventBus>,
}

impl LoggingArtifactCache {
    /// Create a new logging cache around `inner`
    pub fn new(inner: CacheHandle, events: Arc<EventBus>) -> Self {
        Self { inner, events }
    }

    /// Wrap `inner` and return it as a shareable handle
    pub fn decorate(inner: CacheHandle, events: Arc<EventBus>) -> CacheHandle {
        Arc::new(Self::new(inner, events))
    }

    pub fn inner(&self) -> &CacheHandle {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl ArtifactCache for LoggingArtifactCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, key: &RuleKey, output: &Path) -> Result<CacheResult> {
        let cache = self.name().to_string();
        self.events.publish(CacheEvent::FetchStarted {
            cache: cache.clone(),
            key: key.to_string(),
        });

        let start = Instant::now();
        let result = self.inner.fetch(key, output);
        let duration_ms = elapsed_ms(start);

        let outcome = match &result {
            Ok(found) => {
                debug!(cache = %cache, key = %key, duration_ms, result = %found, "Cache fetch");
                FetchOutcome::from(found)
            }
            Err(e) => {
                warn!(cache = %cache, key = %key, duration_ms, error = %e, "Cache fetch failed");
                FetchOutcome::Error(e.to_string())
            }
        };

        self.events.publish(CacheEvent::FetchFinished {
            cache,
            key: key.to_string(),
            outcome,
            duration_ms,
        });
        result
    }

    fn store(&self, key: &RuleKey, artifact: &Path) -> Result<()> {
        let cache = self.name().to_string();
        self.events.publish(CacheEvent::StoreStarted {
            cache: cache.clone(),
            key: key.to_string(),
        });

        let start = Instant::now();
        let result = self.inner.store(key, artifact);
        let duration_ms = elapsed_ms(start);

        match &result {
            Ok(()) => debug!(cache = %cache, key = %key, duration_ms, "Cache store"),
            Err(e) => {
                warn!(cache = %cache, key = %key, duration_ms, error = %e, "Cache store failed")
            }
        }

        self.events.publish(CacheEvent::StoreFinished {
            cache,
            key: key.to_string(),
            success: result.is_ok(),
            duration_ms,
        });
        result
    }

    fn is_store_supported(&self) -> bool {
        self.inner.is_store_supported()
    }

    fn close(&self) -> Result<()> {
        let cache = self.name().to_string();
        self.events.publish(CacheEvent::CloseStarted {
            cache: cache.clone(),
        });

        let start = Instant::now();
        let result = self.inner.close();
        let duration_ms = elapsed_ms(start);

        match &result {
            Ok(()) => debug!(cache = %cache, duration_ms, "Cache closed"),
            Err(e) => debug!(cache = %cache, duration_ms, error = %e, "Cache close failed"),
        }

        self.events.publish(CacheEvent::CloseFinished {
            cache,
            success: result.is_ok(),
            duration_ms,
        });
        result
    }
}

impl fmt::Debug for LoggingArtifactCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingArtifactCache")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
