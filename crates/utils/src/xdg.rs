use stash_core::{APP_DIR_NAME, ARTIFACTS_DIR_NAME, CONFIG_FILE_NAME};
use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for stash
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/stash or fallback
    pub fn config_dir() -> PathBuf {
        base_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR_NAME)
    }

    /// Get XDG_CACHE_HOME/stash or fallback
    pub fn cache_dir() -> PathBuf {
        base_dir("XDG_CACHE_HOME", ".cache").join(APP_DIR_NAME)
    }

    /// Default location of the JSON config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Default root of the directory artifact cache
    pub fn artifacts_dir() -> PathBuf {
        Self::cache_dir().join(ARTIFACTS_DIR_NAME)
    }
}

fn base_dir(var: &str, home_relative: &str) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(home_relative))
                .unwrap_or_else(|| PathBuf::from(home_relative))
        })
}
