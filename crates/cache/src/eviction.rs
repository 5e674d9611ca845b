//! Bounded-size LRU eviction

use std::num::NonZeroUsize;

use crate::errors::Result;
use crate::metadata::Records;
use crate::record::CacheRecord;

/// Keeps the number of unexpired records at or below a bound by removing the
/// least recently accessed ones.
///
/// Expired records are neither counted nor evicted; removing them is purge's job.
#[derive(Debug, Clone, Copy)]
pub struct EvictionEngine {
    max_entries: Option<NonZeroUsize>,
}

impl EvictionEngine {
    pub fn new(max_entries: Option<NonZeroUsize>) -> Self {
        Self { max_entries }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_entries.is_some()
    }

    pub fn max_entries(&self) -> Option<NonZeroUsize> {
        self.max_entries
    }

    /// Delete the metadata rows of the excess least-recently-used records.
    ///
    /// Runs inside the caller's transaction. `protect` is the key the caller
    /// just wrote; it is never chosen. Returns the evicted records so the caller
    /// can remove their blobs once the transaction has committed.
    pub fn enforce(&self, records: &Records<'_>, now: f64, protect: &str) -> Result<Vec<CacheRecord>> {
        let bound = match self.max_entries {
            Some(bound) => bound.get(),
            None => return Ok(Vec::new()),
        };

        let count = records.count_unexpired(now)?;
        if count <= bound {
            return Ok(Vec::new());
        }
        let excess = count - bound;

        // One extra candidate in case the protected key is among the oldest
        let victims: Vec<CacheRecord> = records
            .oldest_unexpired(now, excess + 1)?
            .into_iter()
            .filter(|record| record.key != protect)
            .take(excess)
            .collect();

        for victim in &victims {
            records.delete(&victim.key)?;
            tracing::debug!(
                "Evicted '{}' (last access {:.3})",
                victim.key,
                victim.last_access_at
            );
        }

        if !victims.is_empty() {
            tracing::info!(
                "Evicted {} entries to stay within {} entries",
                victims.len(),
                bound
            );
        }

        Ok(victims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataLocation;
    use crate::metadata::MetadataStore;
    use crate::record::Storage;

    fn seed(store: &MetadataStore, key: &str, expire_at: f64, last_access_at: f64) {
        store
            .upsert(&CacheRecord {
                key: key.to_string(),
                storage: Storage::Inline(vec![0]),
                expire_at,
                last_access_at,
            })
            .unwrap();
    }

    fn keys(store: &MetadataStore) -> Vec<String> {
        let mut keys: Vec<String> = store
            .oldest_unexpired(f64::MIN, 100)
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_disabled_engine_is_noop() {
        let store = MetadataStore::open(&MetadataLocation::InMemory).unwrap();
        for i in 0..5 {
            seed(&store, &format!("k{i}"), 100.0, i as f64);
        }
        let engine = EvictionEngine::new(None);
        assert!(!engine.is_enabled());

        let evicted = store.transaction(|r| engine.enforce(r, 0.0, "k4")).unwrap();
        assert!(evicted.is_empty());
        assert_eq!(store.len().unwrap(), 5);
    }

    #[test]
    fn test_evicts_least_recently_accessed() {
        let store = MetadataStore::open(&MetadataLocation::InMemory).unwrap();
        seed(&store, "old", 100.0, 1.0);
        seed(&store, "older", 100.0, 0.5);
        seed(&store, "recent", 100.0, 3.0);
        seed(&store, "newest", 100.0, 4.0);

        let engine = EvictionEngine::new(NonZeroUsize::new(2));
        let evicted = store
            .transaction(|r| engine.enforce(r, 10.0, "newest"))
            .unwrap();

        let evicted: Vec<&str> = evicted.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(evicted, vec!["older", "old"]);
        assert_eq!(keys(&store), vec!["newest", "recent"]);
    }

    #[test]
    fn test_expired_records_are_not_counted_or_evicted() {
        let store = MetadataStore::open(&MetadataLocation::InMemory).unwrap();
        seed(&store, "expired-1", 5.0, 0.0);
        seed(&store, "expired-2", 5.0, 0.0);
        seed(&store, "live-1", 100.0, 1.0);
        seed(&store, "live-2", 100.0, 2.0);

        let engine = EvictionEngine::new(NonZeroUsize::new(2));
        let evicted = store
            .transaction(|r| engine.enforce(r, 10.0, "live-2"))
            .unwrap();

        assert!(evicted.is_empty());
        assert_eq!(store.len().unwrap(), 4);
    }

    #[test]
    fn test_protected_key_survives_even_when_oldest() {
        let store = MetadataStore::open(&MetadataLocation::InMemory).unwrap();
        seed(&store, "just-written", 100.0, 0.0);
        seed(&store, "a", 100.0, 1.0);
        seed(&store, "b", 100.0, 2.0);

        let engine = EvictionEngine::new(NonZeroUsize::new(1));
        let evicted = store
            .transaction(|r| engine.enforce(r, 10.0, "just-written"))
            .unwrap();

        let evicted: Vec<&str> = evicted.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(evicted, vec!["a", "b"]);
        assert_eq!(keys(&store), vec!["just-written"]);
    }
}
