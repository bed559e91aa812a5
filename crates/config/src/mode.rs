use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache mode determines which directions a live cache honours
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CacheMode {
    /// Caching is disabled
    Off,
    /// Cache can only be read from
    Read,
    /// Cache can be read from and written to (default)
    #[default]
    ReadWrite,
    /// Cache can only be written to
    Write,
}

impl From<String> for CacheMode {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "off" => CacheMode::Off,
            "read" => CacheMode::Read,
            "read-write" | "readwrite" => CacheMode::ReadWrite,
            "write" => CacheMode::Write,
            _ => {
                tracing::warn!(
                    "Unknown cache mode \"{}\", falling back to read-write mode",
                    value
                );
                CacheMode::ReadWrite
            }
        }
    }
}

impl From<&str> for CacheMode {
    fn from(value: &str) -> Self {
        CacheMode::from(value.to_string())
    }
}

impl From<CacheMode> for String {
    fn from(mode: CacheMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode_str = match self {
            CacheMode::Off => "off",
            CacheMode::Read => "read",
            CacheMode::ReadWrite => "read-write",
            CacheMode::Write => "write",
        };
        write!(f, "{}", mode_str)
    }
}

impl CacheMode {
    /// Check if cache can be read from
    pub fn is_readable(&self) -> bool {
        matches!(self, CacheMode::Read | CacheMode::ReadWrite)
    }

    /// Check if cache can be written to
    pub fn is_writable(&self) -> bool {
        matches!(self, CacheMode::Write | CacheMode::ReadWrite)
    }

    pub fn is_off(&self) -> bool {
        matches!(self, CacheMode::Off)
    }
}
