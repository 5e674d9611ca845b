//! Cache write operations

use std::time::Duration;

use crate::core::types::Cache;
use crate::errors::Result;
use crate::record::{CacheRecord, Storage};

impl Cache {
    /// Store `value` under `key` with the default TTL
    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.set_with_ttl(key, value, None)
    }

    /// Store `value` under `key`, replacing any existing record.
    ///
    /// Large values are written to their blob file before the metadata row is
    /// upserted, both under the key's write lock. When a bound is configured,
    /// eviction runs in the same transaction as the upsert; the record written
    /// here is never evicted by its own `set`.
    pub fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.inner.config.default_ttl);

        let guard = self.inner.locks.lock(key);

        let storage = self.inner.placement.place(&self.inner.blobs, key, value)?;
        let now = self.inner.clock.now();
        let record = CacheRecord::new(key, storage, now, ttl.as_secs_f64());

        let (previous, evicted) = self.inner.metadata.transaction(|records| {
            let previous = match records.get(key) {
                Ok(previous) => previous,
                Err(e) if e.is_corruption() => {
                    tracing::warn!("Overwriting corrupt record: {}", e);
                    None
                }
                Err(e) => return Err(e),
            };
            records.upsert(&record)?;
            let evicted = self.inner.eviction.enforce(records, now, key)?;
            Ok((previous, evicted))
        })?;

        self.inner.stats.record_write(record.storage.is_inline());

        // A blob the new record no longer points at (blob to inline downgrade)
        if let Some(Storage::Blob(old_blob)) = previous.map(|p| p.storage) {
            if record.storage.blob_ref() != Some(&old_blob) {
                tracing::debug!("Removing superseded blob {} for '{}'", old_blob, key);
                self.discard_blob(key, &old_blob);
            }
        }

        // Victims belong to other stripes; never hold two at once
        drop(guard);

        if !evicted.is_empty() {
            self.inner.stats.record_evictions(evicted.len() as u64);
            for victim in &evicted {
                if let Storage::Blob(blob) = &victim.storage {
                    self.discard_orphan(&victim.key, blob);
                }
            }
        }

        Ok(())
    }
}
