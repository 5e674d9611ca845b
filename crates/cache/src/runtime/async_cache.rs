//! Async facade over the blocking cache

use std::time::Duration;

use crate::core::Cache;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::purge::PurgeReport;
use crate::record::Freshness;

/// Async handle to a [`Cache`].
///
/// Every call runs the synchronous operation on tokio's blocking pool, so
/// SQLite and file I/O never stall the executor.
#[derive(Debug, Clone)]
pub struct AsyncCache {
    cache: Cache,
}

impl AsyncCache {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// The wrapped synchronous cache
    pub fn inner(&self) -> &Cache {
        &self.cache
    }

    pub fn into_inner(self) -> Cache {
        self.cache
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Cache) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || f(cache))
            .await
            .map_err(|e| CacheError::StoreUnavailable {
                reason: format!("Blocking cache task failed: {e}"),
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                },
            })?
    }

    pub async fn set(&self, key: impl Into<String>, value: Vec<u8>) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.set(&key, &value)).await
    }

    pub async fn set_with_ttl(
        &self,
        key: impl Into<String>,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.set_with_ttl(&key, &value, ttl))
            .await
    }

    pub async fn get(&self, key: impl Into<String>) -> Result<Option<Vec<u8>>> {
        let key = key.into();
        self.run(move |cache| cache.get(&key)).await
    }

    pub async fn get_or(&self, key: impl Into<String>, default: Vec<u8>) -> Result<Vec<u8>> {
        let key = key.into();
        self.run(move |cache| cache.get_or(&key, default)).await
    }

    pub async fn has(&self, key: impl Into<String>) -> Result<Freshness> {
        let key = key.into();
        self.run(move |cache| cache.has(&key)).await
    }

    pub async fn del(&self, key: impl Into<String>) -> Result<bool> {
        let key = key.into();
        self.run(move |cache| cache.del(&key)).await
    }

    pub async fn purge(&self) -> Result<usize> {
        self.run(|cache| cache.purge()).await
    }

    pub async fn purge_report(&self) -> Result<PurgeReport> {
        self.run(|cache| cache.purge_report()).await
    }

    pub async fn destroy(&self) -> Result<()> {
        self.run(|cache| cache.destroy()).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.run(|cache| cache.len()).await
    }

    pub async fn fresh_len(&self) -> Result<usize> {
        self.run(|cache| cache.fresh_len()).await
    }
}

impl From<Cache> for AsyncCache {
    fn from(cache: Cache) -> Self {
        Self::new(cache)
    }
}
