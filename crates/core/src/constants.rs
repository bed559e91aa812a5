//! Constants used throughout the stash codebase

// Environment variable names
pub const STASH_CACHE_VAR: &str = "STASH_CACHE";
pub const STASH_CACHE_ENABLED_VAR: &str = "STASH_CACHE_ENABLED";
pub const STASH_CACHE_DIR_VAR: &str = "STASH_CACHE_DIR";
pub const STASH_CACHE_CLOSE_TIMEOUT_VAR: &str = "STASH_CACHE_CLOSE_TIMEOUT";

// Application directory name under the XDG base directories
pub const APP_DIR_NAME: &str = "stash";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";

// Shutdown
pub const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 10;
pub const CLOSE_POOL_NAME: &str = "close_artifact_caches";

// Events
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

// Rule keys are hex digests; sha256 is 64 chars, leave room for longer digests.
pub const MAX_RULE_KEY_LEN: usize = 128;
