//! Hybrid key-value cache for hybridkv
//!
//! Values at or below an inline threshold live directly in an SQLite
//! metadata store. Larger values are written to blob files sharded by a hash
//! of the key, with only a reference kept in the metadata row. Records carry
//! a TTL; stale records stay readable until a purge pass removes the ones
//! expired for longer than the grace period. An optional entry bound evicts
//! the least recently accessed records.
//!
//! ```no_run
//! use hybridkv_cache::{Cache, CacheConfig, Freshness};
//!
//! # fn main() -> hybridkv_cache::Result<()> {
//! let cache = Cache::open(CacheConfig::default())?;
//! cache.set("greeting", b"hello")?;
//! assert_eq!(cache.has("greeting")?, Freshness::Hit);
//! cache.purge()?;
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod clock;
pub mod config;
pub mod core;
pub mod errors;
pub mod eviction;
pub mod freshness;
pub mod locks;
pub mod metadata;
pub mod placement;
pub mod purge;
pub mod record;
pub mod runtime;
pub mod stats;

pub use blob::{BlobRef, BlobStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CacheConfig, CacheConfigBuilder, CacheConfigLoader, ConfigSource, MetadataLocation,
};
pub use core::Cache;
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use metadata::MetadataStore;
pub use placement::Placement;
pub use purge::PurgeReport;
pub use record::{CacheRecord, Freshness, Storage};
pub use runtime::{AsyncCache, PurgeScheduler};
pub use stats::StatsSnapshot;
