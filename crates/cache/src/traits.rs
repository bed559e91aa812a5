//! Core trait implemented by every artifact cache backend and decorator

use crate::errors::Result;
use stash_core::{FetchOutcome, RuleKey};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared handle to a cache, as handed out by the factory and held by the registry
pub type CacheHandle = Arc<dyn ArtifactCache>;

/// Result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult {
    /// The artifact was found and written to the requested output
    Hit { source: PathBuf },
    /// The cache was consulted and holds no artifact for the key
    Miss,
    /// The cache did not read, e.g. it is write-only or disabled
    Skipped,
}

impl CacheResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheResult::Hit { .. })
    }
}

impl From<&CacheResult> for FetchOutcome {
    fn from(result: &CacheResult) -> Self {
        match result {
            CacheResult::Hit { .. } => FetchOutcome::Hit,
            CacheResult::Miss => FetchOutcome::Miss,
            CacheResult::Skipped => FetchOutcome::Skipped,
        }
    }
}

impl fmt::Display for CacheResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheResult::Hit { source } => write!(f, "hit ({})", source.display()),
            CacheResult::Miss => write!(f, "miss"),
            CacheResult::Skipped => write!(f, "skipped"),
        }
    }
}

/// Operations a build engine performs against an artifact cache.
///
/// Decorators implement this trait too, so wrapping a cache is composition:
/// a wrapped handle is used exactly like the backend it wraps.
pub trait ArtifactCache: Send + Sync + fmt::Debug {
    /// Short diagnostic name used in log fields and events
    fn name(&self) -> &str;

    /// Materialise the artifact stored under `key` at `output`
    fn fetch(&self, key: &RuleKey, output: &Path) -> Result<CacheResult>;

    /// Persist `artifact` under `key`
    fn store(&self, key: &RuleKey, artifact: &Path) -> Result<()>;

    /// Whether `store` can persist anything at all
    fn is_store_supported(&self) -> bool;

    /// Release resources held by the cache.
    ///
    /// Calling `close` more than once must be harmless.
    fn close(&self) -> Result<()>;
}
