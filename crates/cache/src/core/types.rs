//! Core cache types and structures

use std::path::Path;
use std::sync::Arc;

use crate::blob::BlobStore;
use crate::clock::Clock;
use crate::config::{CacheConfig, MetadataLocation};
use crate::eviction::EvictionEngine;
use crate::locks::KeyLocks;
use crate::metadata::MetadataStore;
use crate::placement::PlacementPolicy;
use crate::purge::PurgeEngine;
use crate::stats::{CacheStats, StatsSnapshot};

/// Key-value cache splitting storage between inline metadata and blob files.
///
/// Cloning is cheap and every clone shares the same metadata store, blob
/// directory and counters.
#[derive(Clone)]
pub struct Cache {
    pub(super) inner: Arc<CacheInner>,
}

pub(super) struct CacheInner {
    pub config: CacheConfig,
    pub metadata: MetadataStore,
    pub blobs: BlobStore,
    pub placement: PlacementPolicy,
    pub eviction: EvictionEngine,
    pub purge: PurgeEngine,
    pub locks: KeyLocks,
    pub clock: Arc<dyn Clock>,
    pub stats: CacheStats,
}

impl Cache {
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn blob_root(&self) -> &Path {
        self.inner.blobs.root()
    }

    pub fn metadata_location(&self) -> &MetadataLocation {
        self.inner.metadata.location()
    }

    /// Snapshot of the operation counters
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("blob_root", &self.inner.blobs.root())
            .field("metadata", self.inner.metadata.location())
            .field("inline_threshold", &self.inner.placement.inline_threshold())
            .field("max_entries", &self.inner.eviction.max_entries())
            .finish()
    }
}
