//! Cache read operations

use crate::core::types::Cache;
use crate::errors::Result;
use crate::freshness;
use crate::record::{Freshness, Storage};

impl Cache {
    /// Read the bytes stored under `key`.
    ///
    /// Freshness is not checked: a stale record is returned until purge
    /// removes it. Reading bumps the access time only when eviction is enabled.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // Keeps `del` and purge from removing the blob between lookup and read
        let _guard = self.inner.locks.lock(key);

        let record = match self.inner.metadata.get(key)? {
            Some(record) => record,
            None => {
                self.inner.stats.record_miss();
                return Ok(None);
            }
        };

        let now = self.inner.clock.now();
        let stale = record.is_expired(now);

        let value = match record.storage {
            Storage::Inline(bytes) => bytes,
            Storage::Blob(blob) => self.inner.blobs.read(&blob)?,
        };

        if self.inner.eviction.is_enabled() {
            self.inner.metadata.touch_access(key, now)?;
        }

        self.inner.stats.record_hit(stale);
        Ok(Some(value))
    }

    /// Read the bytes under `key`, or `default` when there is no record
    pub fn get_or(&self, key: &str, default: Vec<u8>) -> Result<Vec<u8>> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Report whether `key` is fresh, stale or absent. Never mutates anything.
    pub fn has(&self, key: &str) -> Result<Freshness> {
        let record = self.inner.metadata.get(key)?;
        Ok(freshness::evaluate(record.as_ref(), self.inner.clock.now()))
    }

    /// Whether `key` has a record stored in a blob file
    pub fn is_blob_backed(&self, key: &str) -> Result<bool> {
        Ok(matches!(
            self.inner.metadata.get(key)?.map(|record| record.storage),
            Some(Storage::Blob(_))
        ))
    }
}
