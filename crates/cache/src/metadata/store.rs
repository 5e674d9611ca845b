//! Owned handle to the metadata database

use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};

use super::records::Records;
use super::schema;
use crate::config::MetadataLocation;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::record::CacheRecord;

/// Handle to the metadata store.
///
/// One connection, serialized behind a mutex. Multi-statement operations go
/// through [`MetadataStore::transaction`] so an eviction or purge pass is never
/// interleaved with another pass touching the same rows. The connection is
/// `None` once the store has been destroyed.
pub struct MetadataStore {
    pub(super) conn: Mutex<Option<Connection>>,
    location: MetadataLocation,
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("location", &self.location)
            .finish()
    }
}

impl MetadataStore {
    /// Open (creating if needed) the store at `location`
    pub fn open(location: &MetadataLocation) -> Result<Self> {
        let conn = match location {
            MetadataLocation::File(path) => open_file(path)?,
            MetadataLocation::InMemory => {
                Connection::open_in_memory().map_err(CacheError::metadata("open in-memory store"))?
            }
            // SQLite treats an empty filename as a private temporary on-disk database
            MetadataLocation::TransientTemp => {
                Connection::open("").map_err(CacheError::metadata("open transient store"))?
            }
        };

        schema::initialize(&conn, location.is_persistent())?;

        tracing::debug!("Opened metadata store at {}", location);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            location: location.clone(),
        })
    }

    pub fn location(&self) -> &MetadataLocation {
        &self.location
    }

    /// Run `f` against the records table inside one immediate transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise.
    pub fn transaction<R>(&self, f: impl FnOnce(&Records<'_>) -> Result<R>) -> Result<R> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or_else(destroyed)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(CacheError::metadata("begin transaction"))?;

        let output = f(&Records::new(&tx))?;

        tx.commit().map_err(CacheError::metadata("commit transaction"))?;
        Ok(output)
    }

    /// Run a single statement outside an explicit transaction
    fn with_records<R>(&self, f: impl FnOnce(&Records<'_>) -> Result<R>) -> Result<R> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or_else(destroyed)?;
        f(&Records::new(conn))
    }

    pub fn upsert(&self, record: &CacheRecord) -> Result<()> {
        self.with_records(|records| records.upsert(record))
    }

    pub fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        self.with_records(|records| records.get(key))
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        self.with_records(|records| records.delete(key))
    }

    pub fn touch_access(&self, key: &str, timestamp: f64) -> Result<bool> {
        self.with_records(|records| records.touch_access(key, timestamp))
    }

    pub fn count_unexpired(&self, now: f64) -> Result<usize> {
        self.with_records(|records| records.count_unexpired(now))
    }

    pub fn oldest_unexpired(&self, now: f64, limit: usize) -> Result<Vec<CacheRecord>> {
        self.with_records(|records| records.oldest_unexpired(now, limit))
    }

    pub fn expired_before(&self, cutoff: f64) -> Result<Vec<CacheRecord>> {
        self.with_records(|records| records.expired_before(cutoff))
    }

    pub fn delete_expired_before(&self, cutoff: f64) -> Result<usize> {
        self.with_records(|records| records.delete_expired_before(cutoff))
    }

    pub fn len(&self) -> Result<usize> {
        self.with_records(|records| records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_records(|records| records.is_empty())
    }

    pub fn is_destroyed(&self) -> bool {
        self.conn.lock().is_none()
    }

    /// Close the connection and remove the database file.
    ///
    /// Ephemeral locations have no file, so for them this is a no-op that
    /// leaves the store usable. Destroying twice is harmless. Returns whether
    /// a file was removed.
    pub fn destroy(&self) -> Result<bool> {
        let path = match &self.location {
            MetadataLocation::File(path) => path,
            MetadataLocation::InMemory | MetadataLocation::TransientTemp => return Ok(false),
        };

        let mut guard = self.conn.lock();
        if let Some(conn) = guard.take() {
            if let Err((conn, e)) = conn.close() {
                *guard = Some(conn);
                return Err(CacheError::metadata("close metadata store")(e));
            }
        }

        let removed = remove_if_exists(path)?;
        for sidecar in sidecar_paths(path) {
            remove_if_exists(&sidecar)?;
        }

        tracing::info!("Destroyed metadata store at {}", path.display());
        Ok(removed)
    }
}

fn destroyed() -> CacheError {
    CacheError::StoreUnavailable {
        reason: "metadata store has been destroyed".to_string(),
        recovery_hint: RecoveryHint::Manual {
            instructions: "Open a new cache".to_string(),
        },
    }
}

fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CacheError::Configuration {
            message: format!(
                "Cannot create metadata directory '{}': {}",
                parent.display(),
                e
            ),
            recovery_hint: RecoveryHint::CheckPermissions {
                path: parent.to_path_buf(),
            },
        })?;
    }

    Connection::open(path).map_err(|e| CacheError::Configuration {
        message: format!("Cannot open metadata store '{}': {}", path.display(), e),
        recovery_hint: RecoveryHint::CheckPermissions {
            path: path.to_path_buf(),
        },
    })
}

/// Write-ahead log and shared-memory files SQLite keeps next to the database
fn sidecar_paths(path: &Path) -> [PathBuf; 2] {
    let with_suffix = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    [with_suffix("-wal"), with_suffix("-shm")]
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            operation: "remove metadata file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        }),
    }
}
