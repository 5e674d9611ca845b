//! Core error types for the cache

use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// Blob or filesystem I/O failure on the read/write path
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Metadata store failure
    Metadata {
        operation: &'static str,
        source: rusqlite::Error,
        recovery_hint: RecoveryHint,
    },

    /// Invalid or unusable configuration
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },

    /// Configuration file could not be parsed
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
        recovery_hint: RecoveryHint,
    },

    /// A metadata row violates the record invariants
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// The worker running a blocking operation went away
    StoreUnavailable {
        reason: String,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Check disk space and clean up if needed
    CheckDiskSpace,

    /// Remove the entry and write it again
    ClearAndRetry,

    /// Update cache configuration
    UpdateConfiguration,

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,
}
