//! Settings loader with precedence handling
//!
//! Defaults are overridden by the config file, which is overridden by
//! `STASH_CACHE*` environment variables, which are overridden by whatever the
//! command line passed in through [`CacheSettingsLoader::overrides`].

use crate::mode::CacheMode;
use crate::settings::{CacheOverrides, CacheSettings, ConfigSource};
use serde::Deserialize;
use stash_core::{
    constants::{
        STASH_CACHE_CLOSE_TIMEOUT_VAR, STASH_CACHE_DIR_VAR, STASH_CACHE_ENABLED_VAR,
        STASH_CACHE_VAR,
    },
    Error, Result,
};
use stash_utils::XdgPaths;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk layout of `config.json`
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    cache: Option<CacheOverrides>,
}

/// Loads [`CacheSettings`] from every source in order
#[derive(Debug, Default)]
pub struct CacheSettingsLoader {
    /// Explicit config file; must exist when set
    config_file: Option<PathBuf>,
    /// Highest-precedence overrides, usually from the command line
    overrides: CacheOverrides,
}

impl CacheSettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this config file instead of the XDG default
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Apply these values last
    pub fn overrides(mut self, overrides: CacheOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load settings with full precedence handling
    pub fn load(self) -> Result<CacheSettings> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup
    pub fn load_with_env<F>(self, lookup: F) -> Result<CacheSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = CacheSettings::default();

        let (path, required) = match self.config_file {
            Some(path) => (path, true),
            None => (XdgPaths::config_file(), false),
        };
        if let Some(file_overrides) = Self::load_from_config_file(&path, required)? {
            settings.apply(file_overrides, ConfigSource::ConfigFile(path));
        }

        settings.apply(
            Self::load_from_env(lookup),
            ConfigSource::EnvironmentVariable(format!("{STASH_CACHE_VAR}*")),
        );

        settings.apply(self.overrides, ConfigSource::CommandLine);

        debug!(
            enabled = settings.enabled,
            mode = %settings.mode,
            close_timeout_secs = settings.close_timeout_secs,
            source = ?settings.source,
            "cache settings resolved"
        );
        Ok(settings)
    }

    fn load_from_config_file(path: &Path, required: bool) -> Result<Option<CacheOverrides>> {
        if !path.exists() {
            if required {
                return Err(Error::configuration(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config file", e))?;

        let file_config: FileConfig = serde_json::from_str(&content).map_err(|e| {
            let message = e.to_string();
            Error::config_file(path, message, e)
        })?;

        Ok(file_config.cache)
    }

    fn load_from_env<F>(lookup: F) -> CacheOverrides
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = CacheOverrides::default();

        if let Some(mode) = lookup(STASH_CACHE_VAR) {
            overrides.mode = Some(CacheMode::from(mode));
        }

        // Takes precedence over the mode when both are present.
        if let Some(enabled) = lookup(STASH_CACHE_ENABLED_VAR) {
            match parse_bool(&enabled) {
                Some(enabled) => overrides.enabled = Some(enabled),
                None => warn!("Ignoring {STASH_CACHE_ENABLED_VAR}=\"{enabled}\": not a boolean"),
            }
        }

        if let Some(dir) = lookup(STASH_CACHE_DIR_VAR).filter(|dir| !dir.is_empty()) {
            overrides.dir = Some(PathBuf::from(dir));
        }

        if let Some(timeout) = lookup(STASH_CACHE_CLOSE_TIMEOUT_VAR) {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => overrides.close_timeout_secs = Some(secs),
                Err(_) => warn!(
                    "Ignoring {STASH_CACHE_CLOSE_TIMEOUT_VAR}=\"{timeout}\": not a number of seconds"
                ),
            }
        }

        overrides
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
