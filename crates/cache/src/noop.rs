//! Cache used when caching is disabled

use crate::errors::Result;
use crate::traits::{ArtifactCache, CacheResult};
use stash_core::RuleKey;
use std::path::Path;

/// A cache that never reads, never writes and closes trivially
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArtifactCache;

impl NoopArtifactCache {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactCache for NoopArtifactCache {
    fn name(&self) -> &str {
        "noop"
    }

    fn fetch(&self, _key: &RuleKey, _output: &Path) -> Result<CacheResult> {
        Ok(CacheResult::Skipped)
    }

    fn store(&self, _key: &RuleKey, _artifact: &Path) -> Result<()> {
        Ok(())
    }

    fn is_store_supported(&self) -> bool {
        false
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_skips_everything() {
        let cache = NoopArtifactCache::new();
        let key = RuleKey::digest(b"noop");
        let output = Path::new("/nonexistent/output");

        assert_eq!(cache.fetch(&key, output).unwrap(), CacheResult::Skipped);
        assert!(cache.store(&key, output).is_ok());
        assert!(!cache.is_store_supported());
        assert_eq!(cache.name(), "noop");
    }

    #[test]
    fn test_noop_close_is_repeatable() {
        let cache = NoopArtifactCache::new();
        for _ in 0..3 {
            assert!(cache.close().is_ok());
        }
    }
}
