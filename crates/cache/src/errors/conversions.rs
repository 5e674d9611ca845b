//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};
use std::path::PathBuf;
use std::time::Duration;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::PermissionDenied => RecoveryHint::UpdateConfiguration,
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                }
            }
            _ => RecoveryHint::CheckDiskSpace,
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Metadata {
            recovery_hint: metadata_recovery_hint(&error),
            operation: "unknown",
            source: error,
        }
    }
}

/// Pick a recovery hint for a metadata store failure
fn metadata_recovery_hint(error: &rusqlite::Error) -> RecoveryHint {
    use rusqlite::ErrorCode;

    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => RecoveryHint::Retry {
            after: Duration::from_millis(50),
        },
        Some(ErrorCode::DiskFull) => RecoveryHint::CheckDiskSpace,
        Some(ErrorCode::ReadOnly) | Some(ErrorCode::CannotOpen) => {
            RecoveryHint::UpdateConfiguration
        }
        Some(ErrorCode::DatabaseCorrupt) | Some(ErrorCode::NotADatabase) => {
            RecoveryHint::Manual {
                instructions: "Destroy the metadata store and let the cache rebuild".to_string(),
            }
        }
        _ => RecoveryHint::Manual {
            instructions: "Inspect the metadata store".to_string(),
        },
    }
}

impl CacheError {
    /// Adapter for `map_err` that names the metadata operation that failed
    pub(crate) fn metadata(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |error| Self::Metadata {
            recovery_hint: metadata_recovery_hint(&error),
            operation,
            source: error,
        }
    }
}
