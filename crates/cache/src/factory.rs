//! Cache factory: turns options into registered, observable cache handles

use crate::errors::Result;
use crate::logging::LoggingArtifactCache;
use crate::noop::NoopArtifactCache;
use crate::registry::CacheRegistry;
use crate::shutdown::{ShutdownCoordinator, ShutdownReport};
use crate::traits::CacheHandle;
use stash_core::{CacheEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, trace};

/// What the factory needs to know to build a cache
pub trait CacheOptions {
    /// When true the factory hands out a no-op cache
    fn is_cache_disabled(&self) -> bool;

    /// Build the live backend. Connectivity and configuration problems surface here.
    fn build_underlying_cache(&self) -> Result<CacheHandle>;
}

/// Creates cache handles and records the live ones for shutdown
#[derive(Debug, Clone)]
pub struct ArtifactCacheFactory {
    events: Arc<EventBus>,
    registry: Arc<CacheRegistry>,
}

impl ArtifactCacheFactory {
    /// Create a new factory publishing to `events` and registering into `registry`
    pub fn new(events: Arc<EventBus>, registry: Arc<CacheRegistry>) -> Self {
        Self { events, registry }
    }

    /// Build a cache handle for `options`.
    ///
    /// A disabled configuration yields a fresh [`NoopArtifactCache`] that is
    /// neither announced nor registered. Otherwise the live cache is built,
    /// wrapped in a [`LoggingArtifactCache`] and appended to the registry.
    /// Every call builds a new handle; nothing is memoised.
    ///
    /// # Errors
    ///
    /// Returns the backend's construction error unchanged. Nothing is
    /// registered in that case.
    pub fn get_or_create<O>(&self, options: &O) -> Result<CacheHandle>
    where
        O: CacheOptions + ?Sized,
    {
        if options.is_cache_disabled() {
            trace!("Caching disabled, using noop cache");
            return Ok(Arc::new(NoopArtifactCache::new()));
        }

        self.events.publish(CacheEvent::ConnectStarted);

        let underlying = match options.build_underlying_cache() {
            Ok(cache) => cache,
            Err(e) => {
                self.events.publish(CacheEvent::ConnectFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let handle = LoggingArtifactCache::decorate(underlying, Arc::clone(&self.events));

        self.events.publish(CacheEvent::ConnectFinished {
            cache: handle.name().to_string(),
        });

        self.registry.append(Arc::clone(&handle));
        debug!(
            cache = handle.name(),
            registered = self.registry.len(),
            "Registered cache"
        );

        Ok(handle)
    }

    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Close every cache this factory registered, waiting at most `timeout_secs`
    pub fn close_created_caches(&self, timeout_secs: u64) -> ShutdownReport {
        ShutdownCoordinator::new(Arc::clone(&self.registry)).close_all(timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CacheError;
    use crate::testing::{CloseBehavior, ScriptedCache, ScriptedOptions};
    use stash_core::SystemEvent;

    fn factory() -> (ArtifactCacheFactory, Arc<EventBus>, Arc<CacheRegistry>) {
        let events = Arc::new(EventBus::new(64));
        let registry = Arc::new(CacheRegistry::new());
        (
            ArtifactCacheFactory::new(Arc::clone(&events), Arc::clone(&registry)),
            events,
            registry,
        )
    }

    fn cache_events(rx: &mut tokio::sync::broadcast::Receiver<stash_core::EnhancedEvent>) -> Vec<CacheEvent> {
        let mut events = Vec::new();
        while let Ok(enhanced) = rx.try_recv() {
            if let SystemEvent::Cache(event) = enhanced.event {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_disabled_returns_noop_without_side_effects() {
        let (factory, events, registry) = factory();
        let mut rx = events.subscribe();
        let options = ScriptedOptions::disabled();

        let handle = factory.get_or_create(&options).unwrap();

        assert_eq!(handle.name(), "noop");
        assert!(handle.close().is_ok());
        assert!(registry.is_empty());
        assert_eq!(options.build_count(), 0);
        assert!(cache_events(&mut rx).is_empty());
    }

    #[test]
    fn test_enabled_registers_decorated_handle() {
        let (factory, events, registry) = factory();
        let mut rx = events.subscribe();
        let options =
            ScriptedOptions::enabled([ScriptedCache::handle("remote", CloseBehavior::Succeed)]);

        let handle = factory.get_or_create(&options).unwrap();

        assert_eq!(handle.name(), "remote");
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.snapshot()[0], &handle));
        assert_eq!(
            cache_events(&mut rx),
            vec![
                CacheEvent::ConnectStarted,
                CacheEvent::ConnectFinished {
                    cache: "remote".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_each_call_creates_a_new_handle() {
        let (factory, _events, registry) = factory();
        let options = ScriptedOptions::enabled([]);

        let first = factory.get_or_create(&options).unwrap();
        let second = factory.get_or_create(&options).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 2);
        assert_eq!(options.build_count(), 2);
    }

    #[test]
    fn test_construction_error_propagates_and_registers_nothing() {
        let (factory, events, registry) = factory();
        let mut rx = events.subscribe();
        let options = ScriptedOptions::failing(CacheError::network(
            "http://cache.invalid",
            "connect",
            "connection refused",
        ));

        let err = factory.get_or_create(&options).unwrap_err();

        assert!(matches!(err, CacheError::Network { .. }));
        assert!(registry.is_empty());
        let seen = cache_events(&mut rx);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], CacheEvent::ConnectStarted);
        assert!(matches!(seen[1], CacheEvent::ConnectFailed { .. }));
    }

    #[test]
    fn test_close_created_caches_uses_own_registry() {
        let (factory, _events, _registry) = factory();
        let options = ScriptedOptions::enabled([]);
        for _ in 0..3 {
            factory.get_or_create(&options).unwrap();
        }

        let report = factory.close_created_caches(5);
        assert_eq!(report.closed(), 3);
        assert!(report.is_complete());
    }
}
