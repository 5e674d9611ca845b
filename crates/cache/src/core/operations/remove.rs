//! Cache remove operations

use crate::blob::BlobRef;
use crate::core::types::Cache;
use crate::errors::Result;

impl Cache {
    /// Remove `key` and its blob, if any. Returns whether a record existed.
    ///
    /// Removing a missing key is not an error.
    pub fn del(&self, key: &str) -> Result<bool> {
        let _guard = self.inner.locks.lock(key);

        let removed = self.inner.metadata.transaction(|records| {
            let blob = match records.get(key) {
                Ok(Some(record)) => record.storage.blob_ref().cloned(),
                Ok(None) => return Ok(None),
                // Nothing trustworthy to read; fall back to the derived location
                Err(e) if e.is_corruption() => {
                    tracing::warn!("Removing corrupt record: {}", e);
                    Some(BlobRef::for_key(key))
                }
                Err(e) => return Err(e),
            };
            records.delete(key)?;
            Ok(Some(blob))
        })?;

        let blob = match removed {
            Some(blob) => blob,
            None => return Ok(false),
        };

        self.inner.stats.record_removal();
        if let Some(blob) = blob {
            self.discard_blob(key, &blob);
        }

        Ok(true)
    }

    /// Total number of records, including stale ones not yet purged
    pub fn len(&self) -> Result<usize> {
        self.inner.metadata.len()
    }

    /// Number of records that have not yet expired
    pub fn fresh_len(&self) -> Result<usize> {
        self.inner.metadata.count_unexpired(self.inner.clock.now())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.inner.metadata.is_empty()
    }
}
