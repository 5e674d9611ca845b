//! Record repository over a SQLite connection or transaction

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::blob::BlobRef;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::record::{CacheRecord, Storage};

const SELECT_COLUMNS: &str = "key, payload, blob_ref, expire_at, last_access_at";

/// Repository operations on the `records` table.
///
/// Borrowed from a [`MetadataStore`](super::MetadataStore) either for a single
/// call or for the duration of a transaction. Statements are prepared once per
/// connection and reused from the statement cache.
pub struct Records<'c> {
    conn: &'c Connection,
}

/// Row as stored, before the storage invariant is checked
struct RawRecord {
    key: String,
    payload: Option<Vec<u8>>,
    blob_ref: Option<String>,
    expire_at: f64,
    last_access_at: f64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            payload: row.get(1)?,
            blob_ref: row.get(2)?,
            expire_at: row.get(3)?,
            last_access_at: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<CacheRecord> {
        let storage = match (self.payload, self.blob_ref) {
            (Some(payload), None) => Storage::Inline(payload),
            (None, Some(stored)) => match BlobRef::parse(&stored) {
                Some(blob) => Storage::Blob(blob),
                None => {
                    return Err(CacheError::Corruption {
                        key: self.key,
                        reason: format!("malformed blob reference '{stored}'"),
                        recovery_hint: RecoveryHint::ClearAndRetry,
                    });
                }
            },
            (Some(_), Some(_)) => {
                return Err(CacheError::Corruption {
                    key: self.key,
                    reason: "both inline payload and blob reference are set".to_string(),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                });
            }
            (None, None) => {
                return Err(CacheError::Corruption {
                    key: self.key,
                    reason: "neither inline payload nor blob reference is set".to_string(),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                });
            }
        };

        Ok(CacheRecord {
            key: self.key,
            storage,
            expire_at: self.expire_at,
            last_access_at: self.last_access_at,
        })
    }
}

impl<'c> Records<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert or fully replace the record for `record.key`
    pub fn upsert(&self, record: &CacheRecord) -> Result<()> {
        let (payload, blob_ref): (Option<&[u8]>, Option<&str>) = match &record.storage {
            Storage::Inline(bytes) => (Some(bytes.as_slice()), None),
            Storage::Blob(blob) => (None, Some(blob.as_str())),
        };

        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT OR REPLACE INTO records (key, payload, blob_ref, expire_at, last_access_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(CacheError::metadata("prepare upsert"))?;
        stmt.execute(params![
            record.key,
            payload,
            blob_ref,
            record.expire_at,
            record.last_access_at
        ])
        .map_err(CacheError::metadata("upsert record"))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {SELECT_COLUMNS} FROM records WHERE key = ?1"))
            .map_err(CacheError::metadata("prepare get"))?;
        let raw = stmt
            .query_row(params![key], RawRecord::from_row)
            .optional()
            .map_err(CacheError::metadata("get record"))?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Delete the record for `key`. Returns whether a row was removed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM records WHERE key = ?1")
            .map_err(CacheError::metadata("prepare delete"))?;
        let changed = stmt
            .execute(params![key])
            .map_err(CacheError::metadata("delete record"))?;
        Ok(changed > 0)
    }

    /// Record a read at `timestamp`. Access times never move backwards.
    pub fn touch_access(&self, key: &str, timestamp: f64) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "UPDATE records SET last_access_at = MAX(last_access_at, ?2) WHERE key = ?1",
            )
            .map_err(CacheError::metadata("prepare touch"))?;
        let changed = stmt
            .execute(params![key, timestamp])
            .map_err(CacheError::metadata("touch record"))?;
        Ok(changed > 0)
    }

    /// Number of records whose expiry is still in the future
    pub fn count_unexpired(&self, now: f64) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM records WHERE expire_at > ?1")
            .map_err(CacheError::metadata("prepare count"))?;
        let count: i64 = stmt
            .query_row(params![now], |row| row.get(0))
            .map_err(CacheError::metadata("count unexpired records"))?;
        Ok(count as usize)
    }

    /// Up to `limit` unexpired records, least recently accessed first.
    ///
    /// Ties on access time fall back to insertion order (`rowid`), which a
    /// full-replace upsert refreshes.
    ///
    /// Walks the access-time index and skips expired rows as it meets them.
    /// Those rows are limited to records still inside the grace window plus
    /// whatever purge has not yet reached, so the walk stays close to `limit`
    /// only while purge keeps up. Purge cannot run here instead: rows within
    /// the grace window must stay readable.
    pub fn oldest_unexpired(&self, now: f64, limit: usize) -> Result<Vec<CacheRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {SELECT_COLUMNS} FROM records INDEXED BY idx_records_last_access_at
                 WHERE expire_at > ?1
                 ORDER BY last_access_at ASC, rowid ASC
                 LIMIT ?2"
            ))
            .map_err(CacheError::metadata("prepare oldest unexpired"))?;
        let rows = stmt
            .query_map(params![now, limit as i64], RawRecord::from_row)
            .map_err(CacheError::metadata("scan oldest unexpired"))?;
        collect_records(rows, "scan oldest unexpired")
    }

    /// Records whose expiry is strictly before `cutoff`, oldest expiry first
    pub fn expired_before(&self, cutoff: f64) -> Result<Vec<CacheRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {SELECT_COLUMNS} FROM records
                 WHERE expire_at < ?1
                 ORDER BY expire_at ASC"
            ))
            .map_err(CacheError::metadata("prepare expired before"))?;
        let rows = stmt
            .query_map(params![cutoff], RawRecord::from_row)
            .map_err(CacheError::metadata("scan expired records"))?;
        collect_records(rows, "scan expired records")
    }

    /// Blob references of records expiring strictly before `cutoff`.
    ///
    /// Skips loading inline payloads, which purge has no use for.
    pub fn expired_blobs_before(&self, cutoff: f64) -> Result<Vec<(String, BlobRef)>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT key, blob_ref FROM records
                 WHERE expire_at < ?1 AND blob_ref IS NOT NULL",
            )
            .map_err(CacheError::metadata("prepare expired blobs"))?;
        let rows = stmt
            .query_map(params![cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(CacheError::metadata("scan expired blobs"))?;

        let mut blobs = Vec::new();
        for row in rows {
            let (key, stored) = row.map_err(CacheError::metadata("scan expired blobs"))?;
            match BlobRef::parse(&stored) {
                Some(blob) => blobs.push((key, blob)),
                None => {
                    tracing::warn!("Ignoring malformed blob reference '{}' for key '{}'", stored, key);
                }
            }
        }
        Ok(blobs)
    }

    /// Delete every record expiring strictly before `cutoff`
    pub fn delete_expired_before(&self, cutoff: f64) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM records WHERE expire_at < ?1")
            .map_err(CacheError::metadata("prepare delete expired"))?;
        stmt.execute(params![cutoff])
            .map_err(CacheError::metadata("delete expired records"))
    }

    /// Total number of records, expired or not
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM records")
            .and_then(|mut stmt| stmt.query_row([], |row| row.get(0)))
            .map_err(CacheError::metadata("count records"))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn collect_records<I>(rows: I, operation: &'static str) -> Result<Vec<CacheRecord>>
where
    I: Iterator<Item = rusqlite::Result<RawRecord>>,
{
    let mut records = Vec::new();
    for row in rows {
        let raw = row.map_err(CacheError::metadata(operation))?;
        records.push(raw.into_record()?);
    }
    Ok(records)
}
