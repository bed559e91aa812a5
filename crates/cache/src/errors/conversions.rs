//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};
use std::path::PathBuf;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: PathBuf::from("."),
            },
            ErrorKind::NotFound => RecoveryHint::Recreate,
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                RecoveryHint::Retry {
                    after: std::time::Duration::from_millis(100),
                }
            }
            _ => RecoveryHint::Manual {
                instructions: "Inspect the underlying I/O error".to_string(),
            },
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

/// Convert cache errors to core errors
impl From<CacheError> for stash_core::Error {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Network {
                endpoint, source, ..
            } => stash_core::Error::network(endpoint, source.to_string()),
            CacheError::Io {
                path,
                operation,
                source,
                ..
            } => stash_core::Error::FileSystem {
                path,
                operation: operation.to_string(),
                source,
            },
            other => stash_core::Error::configuration(other.to_string()),
        }
    }
}

impl From<stash_core::Error> for CacheError {
    fn from(error: stash_core::Error) -> Self {
        match error {
            stash_core::Error::InvalidKey { key, reason } => CacheError::InvalidKey {
                key,
                reason,
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Use a hexadecimal rule key".to_string(),
                },
            },
            other => CacheError::Configuration {
                message: other.to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_keeps_endpoint_in_core_error() {
        let err = CacheError::network("grpc://cache:443", "connect", "connection refused");
        let core: stash_core::Error = err.into();

        match &core {
            stash_core::Error::Network { endpoint, message } => {
                assert_eq!(endpoint, "grpc://cache:443");
                assert_eq!(message, "connection refused");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_closed_becomes_configuration_error() {
        let core: stash_core::Error = CacheError::closed("dir").into();
        assert!(matches!(core, stash_core::Error::Configuration { .. }));
        assert!(core.to_string().contains("Cache 'dir' has been closed"));
    }

    #[test]
    fn test_invalid_core_key_becomes_invalid_key() {
        let err: CacheError = stash_core::Error::invalid_key("zz", "not hex").into();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
    }
}
