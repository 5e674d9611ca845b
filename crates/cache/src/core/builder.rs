//! Cache construction

use std::fs;
use std::sync::Arc;

use super::types::{Cache, CacheInner};
use crate::blob::BlobStore;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::eviction::EvictionEngine;
use crate::locks::KeyLocks;
use crate::metadata::MetadataStore;
use crate::placement::PlacementPolicy;
use crate::purge::PurgeEngine;
use crate::stats::CacheStats;

impl Cache {
    /// Open a cache using the wall clock
    pub fn open(config: CacheConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Open a cache with an explicit time source
    pub fn open_with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.blob_root).map_err(|e| CacheError::Configuration {
            message: format!(
                "Cannot create blob root '{}': {}",
                config.blob_root.display(),
                e
            ),
            recovery_hint: RecoveryHint::CheckPermissions {
                path: config.blob_root.clone(),
            },
        })?;

        let metadata = MetadataStore::open(&config.metadata)?;

        tracing::info!(
            blob_root = %config.blob_root.display(),
            metadata = %config.metadata,
            inline_threshold = config.inline_threshold,
            max_entries = ?config.max_entries,
            "Opened cache"
        );

        let inner = CacheInner {
            blobs: BlobStore::new(config.blob_root.clone()),
            placement: PlacementPolicy::new(config.inline_threshold),
            eviction: EvictionEngine::new(config.max_entries),
            purge: PurgeEngine::new(config.grace_period),
            locks: KeyLocks::default(),
            metadata,
            clock,
            stats: CacheStats::default(),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}
