//! Test doubles for the factory and shutdown paths
//!
//! Used by this crate's own tests and by downstream crates that need caches
//! with scripted close behaviour.

use crate::errors::{CacheError, Result};
use crate::factory::CacheOptions;
use crate::traits::{ArtifactCache, CacheHandle, CacheResult};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use stash_core::RuleKey;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How a [`ScriptedCache`] behaves when closed
#[derive(Debug, Clone)]
pub enum CloseBehavior {
    Succeed,
    /// Return a network error
    Fail,
    Panic,
    /// Block until the paired sender is dropped
    Hang(Receiver<()>),
    Delay(Duration),
}

impl CloseBehavior {
    /// A hanging close plus the sender that releases it when dropped
    pub fn gate() -> (Sender<()>, Self) {
        let (release, wait) = channel::bounded(0);
        (release, CloseBehavior::Hang(wait))
    }
}

/// Cache whose fetch always misses and whose close follows a script
#[derive(Debug)]
pub struct ScriptedCache {
    name: String,
    close: CloseBehavior,
    close_calls: AtomicUsize,
}

impl ScriptedCache {
    pub fn new(name: impl Into<String>, close: CloseBehavior) -> Self {
        Self {
            name: name.into(),
            close,
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Wrap a new scripted cache in a handle
    pub fn handle(name: impl Into<String>, close: CloseBehavior) -> CacheHandle {
        Arc::new(Self::new(name, close))
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl ArtifactCache for ScriptedCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, _key: &RuleKey, _output: &Path) -> Result<CacheResult> {
        Ok(CacheResult::Miss)
    }

    fn store(&self, _key: &RuleKey, _artifact: &Path) -> Result<()> {
        Ok(())
    }

    fn is_store_supported(&self) -> bool {
        true
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        match &self.close {
            CloseBehavior::Succeed => Ok(()),
            CloseBehavior::Fail => Err(CacheError::network(
                self.name.clone(),
                "close",
                "connection reset by peer",
            )),
            CloseBehavior::Panic => panic!("close of {} panicked", self.name),
            CloseBehavior::Hang(wait) => {
                let _ = wait.recv();
                Ok(())
            }
            CloseBehavior::Delay(delay) => {
                thread::sleep(*delay);
                Ok(())
            }
        }
    }
}

/// Factory options that hand out pre-built caches in order
pub struct ScriptedOptions {
    disabled: bool,
    queue: Mutex<VecDeque<Result<CacheHandle>>>,
    builds: AtomicUsize,
}

impl ScriptedOptions {
    /// Options with caching switched off
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            queue: Mutex::new(VecDeque::new()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Options that build the given caches, one per call. Once the list runs
    /// out, further builds produce instantly-closing scripted caches.
    pub fn enabled(handles: impl IntoIterator<Item = CacheHandle>) -> Self {
        Self {
            disabled: false,
            queue: Mutex::new(handles.into_iter().map(Ok).collect()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Options whose next build fails with `error`
    pub fn failing(error: CacheError) -> Self {
        Self {
            disabled: false,
            queue: Mutex::new(VecDeque::from([Err(error)])),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl CacheOptions for ScriptedOptions {
    fn is_cache_disabled(&self) -> bool {
        self.disabled
    }

    fn build_underlying_cache(&self) -> Result<CacheHandle> {
        let n = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        match self.queue.lock().pop_front() {
            Some(next) => next,
            None => Ok(ScriptedCache::handle(
                format!("scripted-{n}"),
                CloseBehavior::Succeed,
            )),
        }
    }
}
