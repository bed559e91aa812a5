//! Factory options backed by resolved cache settings

use crate::dir::DirArtifactCache;
use crate::errors::Result;
use crate::factory::CacheOptions;
use crate::traits::CacheHandle;
use stash_config::CacheSettings;
use std::sync::Arc;

impl CacheOptions for CacheSettings {
    fn is_cache_disabled(&self) -> bool {
        CacheSettings::is_cache_disabled(self)
    }

    fn build_underlying_cache(&self) -> Result<CacheHandle> {
        let cache = DirArtifactCache::open(self.cache_dir(), self.mode)?;
        Ok(Arc::new(cache))
    }
}
