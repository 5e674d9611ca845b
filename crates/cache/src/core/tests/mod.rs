//! Cache behaviour tests driven by a manual clock

mod expiry;

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::blob::BlobRef;
use crate::clock::ManualClock;
use crate::config::{CacheConfigBuilder, MetadataLocation};
use crate::core::Cache;

pub(super) const THRESHOLD: usize = 10;
pub(super) const TTL: Duration = Duration::from_secs(60);
pub(super) const GRACE: Duration = Duration::from_secs(30);

pub(super) struct Harness {
    pub cache: Cache,
    pub clock: Arc<ManualClock>,
    pub dir: TempDir,
}

impl Harness {
    pub fn blob_path(&self, key: &str) -> std::path::PathBuf {
        BlobRef::for_key(key).resolve(&self.dir.path().join("blobs"))
    }

    pub fn tick(&self, secs: f64) {
        self.clock.advance(Duration::from_secs_f64(secs));
    }
}

/// In-memory metadata, blobs under a temp dir, threshold 10 bytes, TTL 60s, grace 30s
pub(super) fn harness(configure: impl FnOnce(CacheConfigBuilder) -> CacheConfigBuilder) -> Harness {
    let dir = TempDir::new().unwrap();
    let builder = CacheConfigBuilder::new()
        .with_blob_root(dir.path().join("blobs"))
        .with_metadata(MetadataLocation::InMemory)
        .with_default_ttl(TTL)
        .with_grace_period(GRACE)
        .with_inline_threshold(THRESHOLD);
    let config = configure(builder).build();

    let clock = Arc::new(ManualClock::default());
    let cache = Cache::open_with_clock(config, clock.clone()).unwrap();
    Harness { cache, clock, dir }
}
