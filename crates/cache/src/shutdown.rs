//! Bounded-time shutdown of every registered cache
//!
//! All closes are started at once on a dedicated pool, then the caller waits
//! for them up to a hard deadline. Closes still running at the deadline are
//! abandoned: their threads keep going but nobody looks at the result.

use crate::registry::CacheRegistry;
use crate::traits::ArtifactCache;
use crossbeam::channel;
use stash_core::CLOSE_POOL_NAME;
use stash_utils::WorkerPool;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What happened to one cache during shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Closed,
    /// `close` returned an error or panicked
    Failed { error: String },
    /// Still running when the deadline passed
    TimedOut,
}

/// Outcome for a single registered cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownEntry {
    pub cache: String,
    pub outcome: ShutdownOutcome,
}

/// Summary of a shutdown pass, in registry order
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    entries: Vec<ShutdownEntry>,
    elapsed: Duration,
}

impl ShutdownReport {
    pub fn entries(&self) -> &[ShutdownEntry] {
        &self.entries
    }

    /// Wall time spent inside the shutdown pass
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn closed(&self) -> usize {
        self.count(|o| matches!(o, ShutdownOutcome::Closed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ShutdownOutcome::Failed { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|o| matches!(o, ShutdownOutcome::TimedOut))
    }

    /// True when every cache closed cleanly
    pub fn is_complete(&self) -> bool {
        self.closed() == self.entries.len()
    }

    fn count(&self, pred: impl Fn(&ShutdownOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closed {} of {} caches in {:.2}s",
            self.closed(),
            self.len(),
            self.elapsed.as_secs_f64()
        )?;
        if self.failed() > 0 {
            write!(f, ", {} failed", self.failed())?;
        }
        if self.timed_out() > 0 {
            write!(f, ", {} timed out", self.timed_out())?;
        }
        Ok(())
    }
}

/// Closes every handle in a registry within a deadline
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    registry: Arc<CacheRegistry>,
    pool_name: String,
}

impl ShutdownCoordinator {
    /// Create a new coordinator over `registry`
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self {
            registry,
            pool_name: CLOSE_POOL_NAME.to_string(),
        }
    }

    /// Name prefix for the close threads
    pub fn with_pool_name(mut self, name: impl Into<String>) -> Self {
        self.pool_name = name.into();
        self
    }

    /// Close every registered cache, blocking for at most `timeout_secs`.
    ///
    /// Closes run concurrently, one thread per cache, so a hung close delays
    /// neither its siblings nor the deadline. Errors and panics from `close`
    /// are recorded in the report and never returned. A zero timeout starts
    /// all closes and returns without waiting.
    pub fn close_all(&self, timeout_secs: u64) -> ShutdownReport {
        self.close_all_within(Duration::from_secs(timeout_secs))
    }

    /// Same as [`close_all`](Self::close_all) with a sub-second timeout.
    ///
    /// The deadline is fixed on entry, so starting the close threads counts
    /// against `timeout` rather than adding to it.
    pub fn close_all_within(&self, timeout: Duration) -> ShutdownReport {
        let start = Instant::now();
        let deadline = start.checked_add(timeout);
        let handles = self.registry.snapshot();

        if handles.is_empty() {
            debug!("No caches to close");
            return ShutdownReport {
                entries: Vec::new(),
                elapsed: start.elapsed(),
            };
        }

        let (done_tx, done_rx) = channel::unbounded::<(usize, ShutdownOutcome)>();
        let mut pool = WorkerPool::new_fixed_pool(self.pool_name.as_str(), handles.len());

        for (index, handle) in handles.iter().enumerate() {
            let handle = Arc::clone(handle);
            let done = done_tx.clone();
            let submission = pool.submit(move || {
                let outcome = close_one(handle.as_ref());
                let _ = done.send((index, outcome));
            });
            if !submission.is_accepted() {
                warn!(pool = %self.pool_name, cache = handles[index].name(), "Close task was rejected");
            }
        }
        drop(done_tx);
        pool.shutdown();

        debug!(
            pool = %self.pool_name,
            caches = handles.len(),
            ?timeout,
            "Waiting for caches to close"
        );
        let remaining =
            deadline.map_or(timeout, |deadline| deadline.saturating_duration_since(Instant::now()));
        let finished = pool.await_termination(remaining);

        let mut outcomes: Vec<Option<ShutdownOutcome>> = vec![None; handles.len()];
        for (index, outcome) in done_rx.try_iter() {
            outcomes[index] = Some(outcome);
        }

        let entries: Vec<ShutdownEntry> = handles
            .iter()
            .zip(outcomes)
            .map(|(handle, outcome)| ShutdownEntry {
                cache: handle.name().to_string(),
                outcome: outcome.unwrap_or(ShutdownOutcome::TimedOut),
            })
            .collect();

        for entry in &entries {
            if let ShutdownOutcome::Failed { error } = &entry.outcome {
                warn!(cache = %entry.cache, error = %error, "Failed to close cache");
            }
        }

        let report = ShutdownReport {
            entries,
            elapsed: start.elapsed(),
        };

        if !finished && report.timed_out() > 0 {
            warn!(
                pool = %self.pool_name,
                pending = report.timed_out(),
                ?timeout,
                "Abandoning caches that did not close in time"
            );
        }

        debug!(%report, "Cache shutdown finished");
        report
    }
}

fn close_one(cache: &dyn ArtifactCache) -> ShutdownOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| cache.close())) {
        Ok(Ok(())) => ShutdownOutcome::Closed,
        Ok(Err(e)) => ShutdownOutcome::Failed {
            error: e.to_string(),
        },
        Err(payload) => ShutdownOutcome::Failed {
            error: format!("close panicked: {}", panic_message(payload.as_ref())),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CloseBehavior, ScriptedCache};
    use crate::traits::CacheHandle;

    fn registry_of(handles: Vec<CacheHandle>) -> Arc<CacheRegistry> {
        let registry = Arc::new(CacheRegistry::new());
        for handle in handles {
            registry.append(handle);
        }
        registry
    }

    #[test]
    fn test_empty_registry_returns_immediately() {
        let report = ShutdownCoordinator::new(Arc::new(CacheRegistry::new())).close_all(5);
        assert!(report.is_empty());
        assert!(report.is_complete());
        assert!(report.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_all_close_before_deadline() {
        let caches: Vec<Arc<ScriptedCache>> = (0..4)
            .map(|i| Arc::new(ScriptedCache::new(format!("c{i}"), CloseBehavior::Succeed)))
            .collect();
        let registry = registry_of(caches.iter().map(|c| Arc::clone(c) as CacheHandle).collect());

        let report = ShutdownCoordinator::new(registry).close_all(5);

        assert_eq!(report.closed(), 4);
        assert!(report.is_complete());
        assert!(report.elapsed() < Duration::from_secs(5));
        assert!(caches.iter().all(|c| c.close_calls() == 1));
        let names: Vec<_> = report.entries().iter().map(|e| e.cache.as_str()).collect();
        assert_eq!(names, ["c0", "c1", "c2", "c3"]);
    }

    #[test]
    fn test_closes_run_concurrently() {
        let registry = registry_of(
            (0..5)
                .map(|i| {
                    ScriptedCache::handle(
                        format!("slow{i}"),
                        CloseBehavior::Delay(Duration::from_millis(300)),
                    )
                })
                .collect(),
        );

        let report = ShutdownCoordinator::new(registry).close_all(5);

        assert_eq!(report.closed(), 5);
        // Serial closing would take 1.5s
        assert!(report.elapsed() < Duration::from_millis(1200));
    }

    #[test]
    fn test_failure_and_panic_do_not_affect_siblings() {
        let registry = registry_of(vec![
            ScriptedCache::handle("ok-1", CloseBehavior::Succeed),
            ScriptedCache::handle("broken", CloseBehavior::Fail),
            ScriptedCache::handle("explodes", CloseBehavior::Panic),
            ScriptedCache::handle("ok-2", CloseBehavior::Succeed),
        ]);

        let report = ShutdownCoordinator::new(registry).close_all(5);

        assert_eq!(report.closed(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.timed_out(), 0);
        assert!(!report.is_complete());
        match &report.entries()[2].outcome {
            ShutdownOutcome::Failed { error } => assert!(error.contains("panicked")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_zero_timeout_does_not_wait() {
        let (release, hang) = CloseBehavior::gate();
        let registry = registry_of(vec![ScriptedCache::handle("hung", hang)]);

        let report = ShutdownCoordinator::new(registry).close_all(0);

        assert_eq!(report.timed_out(), 1);
        assert!(report.elapsed() < Duration::from_millis(500));
        drop(release);
    }

    #[test]
    fn test_thread_startup_counts_against_deadline() {
        let (release, hang) = CloseBehavior::gate();
        let registry = registry_of(
            (0..256)
                .map(|i| ScriptedCache::handle(format!("hung{i}"), hang.clone()))
                .collect(),
        );
        let timeout = Duration::from_millis(300);

        let report = ShutdownCoordinator::new(registry).close_all_within(timeout);

        assert_eq!(report.timed_out(), 256);
        assert!(report.elapsed() >= Duration::from_millis(250));
        assert!(
            report.elapsed() < timeout + Duration::from_millis(500),
            "took {:?}",
            report.elapsed()
        );
        drop(release);
    }

    #[test]
    fn test_pool_name_is_used_for_close_threads() {
        let registry = Arc::new(CacheRegistry::new());
        registry.append(Arc::new(ThreadNameCache::default()));
        let closer = registry.snapshot()[0].clone();

        ShutdownCoordinator::new(registry)
            .with_pool_name("teardown")
            .close_all(5);

        assert_eq!(closer.name(), "teardown-1");
    }

    /// Reports the name of the thread that closed it
    #[derive(Debug, Default)]
    struct ThreadNameCache {
        closed_on: std::sync::OnceLock<String>,
    }

    impl ArtifactCache for ThreadNameCache {
        fn name(&self) -> &str {
            self.closed_on.get().map(String::as_str).unwrap_or("unclosed")
        }

        fn fetch(
            &self,
            _key: &stash_core::RuleKey,
            _output: &std::path::Path,
        ) -> crate::Result<crate::CacheResult> {
            Ok(crate::CacheResult::Miss)
        }

        fn store(&self, _key: &stash_core::RuleKey, _artifact: &std::path::Path) -> crate::Result<()> {
            Ok(())
        }

        fn is_store_supported(&self) -> bool {
            false
        }

        fn close(&self) -> crate::Result<()> {
            let name = std::thread::current().name().unwrap_or("unnamed").to_string();
            let _ = self.closed_on.set(name);
            Ok(())
        }
    }
}
