//! Table layout and connection setup

use rusqlite::Connection;
use std::time::Duration;

use crate::errors::{CacheError, RecoveryHint, Result};

/// Value stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    key            TEXT PRIMARY KEY NOT NULL,
    payload        BLOB,
    blob_ref       TEXT,
    expire_at      REAL NOT NULL,
    last_access_at REAL NOT NULL,
    CHECK ((payload IS NULL) <> (blob_ref IS NULL))
);
CREATE INDEX IF NOT EXISTS idx_records_expire_at ON records (expire_at);
CREATE INDEX IF NOT EXISTS idx_records_last_access_at ON records (last_access_at);
";

/// Apply pragmas and create the schema if missing
pub(super) fn initialize(conn: &Connection, persistent: bool) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(CacheError::metadata("set busy timeout"))?;

    if persistent {
        // journal_mode returns the resulting mode as a row
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(CacheError::metadata("enable write-ahead log"))?;
        tracing::debug!("Metadata journal mode: {}", mode);
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(CacheError::metadata("set synchronous mode"))?;
    }

    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(CacheError::metadata("read schema version"))?;

    if version > SCHEMA_VERSION {
        return Err(CacheError::Configuration {
            message: format!(
                "Metadata store uses schema version {version}, newer than supported version {SCHEMA_VERSION}"
            ),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Upgrade hybridkv or point the cache at a fresh metadata location"
                    .to_string(),
            },
        });
    }

    conn.execute_batch(CREATE_SCHEMA)
        .map_err(CacheError::metadata("create schema"))?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(CacheError::metadata("write schema version"))?;

    Ok(())
}
