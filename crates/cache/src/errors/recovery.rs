//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Metadata { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }

    /// Check if this error indicates data corruption
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }

    /// Check if this error was raised while constructing the cache
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Serialization { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_busy_database_is_transient() {
        let err = CacheError::from(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(err.is_transient());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_corruption_classification() {
        let err = CacheError::Corruption {
            key: "k".to_string(),
            reason: "both payload and blob reference are set".to_string(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        assert!(err.is_corruption());
        assert!(!err.is_transient());
        assert_eq!(err.recovery_hint(), &RecoveryHint::ClearAndRetry);
    }

    #[test]
    fn test_display_includes_path_and_operation() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/blobs/ab/cd/ef.v"),
            operation: "read blob",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            recovery_hint: RecoveryHint::Retry {
                after: Duration::from_millis(10),
            },
        };
        let message = err.to_string();
        assert!(message.contains("read blob"));
        assert!(message.contains("/tmp/blobs/ab/cd/ef.v"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
