//! Resolved cache settings and the partial overrides that feed them

use crate::mode::CacheMode;
use serde::Deserialize;
use stash_core::DEFAULT_CLOSE_TIMEOUT_SECS;
use stash_utils::XdgPaths;
use std::path::PathBuf;
use std::time::Duration;

/// Where the effective settings last came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
    /// Command line argument
    CommandLine,
}

/// Effective cache settings for one process run
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Whether caching is enabled at all
    pub enabled: bool,
    /// Which directions the live cache honours
    pub mode: CacheMode,
    /// Root of the directory cache; `None` means the XDG default
    pub dir: Option<PathBuf>,
    /// How long shutdown waits for caches to close
    pub close_timeout_secs: u64,
    /// Highest-precedence source that contributed a value
    pub source: ConfigSource,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CacheMode::ReadWrite,
            dir: None,
            close_timeout_secs: DEFAULT_CLOSE_TIMEOUT_SECS,
            source: ConfigSource::Default,
        }
    }
}

impl CacheSettings {
    pub fn builder() -> CacheSettingsBuilder {
        CacheSettingsBuilder::new()
    }

    /// True when caching is switched off either explicitly or through the mode
    pub fn is_cache_disabled(&self) -> bool {
        !self.enabled || self.mode.is_off()
    }

    /// Directory backing the artifact cache
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(XdgPaths::artifacts_dir)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    /// Layer `overrides` on top, recording `source` if anything changed
    pub fn apply(&mut self, overrides: CacheOverrides, source: ConfigSource) {
        if overrides.is_empty() {
            return;
        }
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(dir) = overrides.dir {
            self.dir = Some(dir);
        }
        if let Some(timeout) = overrides.close_timeout_secs {
            self.close_timeout_secs = timeout;
        }
        self.source = source;
    }
}

/// A partial set of settings from one source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CacheOverrides {
    pub enabled: Option<bool>,
    pub mode: Option<CacheMode>,
    pub dir: Option<PathBuf>,
    pub close_timeout_secs: Option<u64>,
}

impl CacheOverrides {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.mode.is_none()
            && self.dir.is_none()
            && self.close_timeout_secs.is_none()
    }
}

/// Builder for programmatic settings
pub struct CacheSettingsBuilder {
    settings: CacheSettings,
}

impl CacheSettingsBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            settings: CacheSettings::default(),
        }
    }

    /// Set global cache enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.settings.enabled = enabled;
        self
    }

    /// Set cache mode
    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.settings.mode = mode;
        self
    }

    /// Set cache directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.dir = Some(dir.into());
        self
    }

    /// Set close timeout in seconds
    pub fn with_close_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.close_timeout_secs = secs;
        self
    }

    /// Set configuration source
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.settings.source = source;
        self
    }

    pub fn build(self) -> CacheSettings {
        self.settings
    }
}

impl Default for CacheSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.mode, CacheMode::ReadWrite);
        assert_eq!(settings.close_timeout(), Duration::from_secs(10));
        assert!(!settings.is_cache_disabled());
        assert_eq!(settings.source, ConfigSource::Default);
    }

    #[test]
    fn test_disabled_by_flag_or_mode() {
        assert!(CacheSettings::builder()
            .with_enabled(false)
            .build()
            .is_cache_disabled());
        assert!(CacheSettings::builder()
            .with_mode(CacheMode::Off)
            .build()
            .is_cache_disabled());
        assert!(!CacheSettings::builder()
            .with_mode(CacheMode::Read)
            .build()
            .is_cache_disabled());
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut settings = CacheSettings::builder().with_dir("/tmp/a").build();
        settings.apply(
            CacheOverrides {
                mode: Some(CacheMode::Read),
                ..Default::default()
            },
            ConfigSource::CommandLine,
        );

        assert_eq!(settings.mode, CacheMode::Read);
        assert_eq!(settings.dir, Some(PathBuf::from("/tmp/a")));
        assert!(settings.enabled);
        assert_eq!(settings.source, ConfigSource::CommandLine);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut settings = CacheSettings::default();
        settings.apply(CacheOverrides::default(), ConfigSource::CommandLine);
        assert_eq!(settings.source, ConfigSource::Default);
    }

    #[test]
    fn test_explicit_dir_wins_over_xdg() {
        let settings = CacheSettings::builder().with_dir("/srv/cache").build();
        assert_eq!(settings.cache_dir(), PathBuf::from("/srv/cache"));
    }
}
