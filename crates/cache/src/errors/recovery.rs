//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. }
            | Self::Network { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. }
            | Self::Closed { recovery_hint, .. }
            | Self::InvalidKey { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.recovery_hint(),
            RecoveryHint::Retry { .. } | RecoveryHint::CheckNetwork { .. }
        )
    }

    /// Check if this error means the backend could not be reached or created
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::StoreUnavailable { .. })
    }

    /// Network error with the standard connectivity hint
    pub fn network(
        endpoint: impl Into<String>,
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self::Network {
            recovery_hint: RecoveryHint::CheckNetwork {
                endpoint: endpoint.clone(),
            },
            endpoint,
            operation,
            source: source.into(),
        }
    }

    /// Error for an operation on a closed cache
    pub fn closed(cache: impl Into<String>) -> Self {
        Self::Closed {
            cache: cache.into(),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Request a new cache handle from the factory".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreType;

    #[test]
    fn test_network_errors_are_transient() {
        let err = CacheError::network("http://cache:8080", "connect", "connection refused");
        assert!(err.is_transient());
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("http://cache:8080"));
    }

    #[test]
    fn test_closed_is_not_transient() {
        let err = CacheError::closed("dir");
        assert!(!err.is_transient());
        assert!(!err.is_connectivity());
        assert_eq!(err.to_string(), "Cache 'dir' has been closed");
    }

    #[test]
    fn test_store_unavailable_is_connectivity() {
        let err = CacheError::StoreUnavailable {
            store_type: StoreType::FileSystem,
            reason: "read-only file system".to_string(),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        };
        assert!(err.is_connectivity());
    }
}
