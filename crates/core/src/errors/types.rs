//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for stash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stash operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    Configuration { message: String },

    /// Configuration file could not be parsed
    ConfigFile {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A rule key failed validation
    InvalidKey { key: String, reason: String },

    /// Network-related errors
    Network { endpoint: String, message: String },
}
