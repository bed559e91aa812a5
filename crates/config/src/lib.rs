//! Cache configuration for stash
//!
//! Settings are resolved once at startup with the following precedence,
//! lowest first: built-in defaults, the JSON config file, `STASH_CACHE*`
//! environment variables, then command-line overrides.

mod loader;
mod mode;
mod settings;

pub use loader::CacheSettingsLoader;
pub use mode::CacheMode;
pub use settings::{CacheOverrides, CacheSettings, CacheSettingsBuilder, ConfigSource};
