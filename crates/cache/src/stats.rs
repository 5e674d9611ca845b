//! Cache statistics with atomic counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    inline_writes: AtomicU64,
    blob_writes: AtomicU64,
    removals: AtomicU64,
    evictions: AtomicU64,
    purged: AtomicU64,
    reclaimed_dirs: AtomicU64,
    cleanup_errors: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self, stale: bool) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if stale {
            self.stale_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, inline: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if inline {
            self.inline_writes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.blob_writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_purge(&self, records: u64, dirs: u64) {
        self.purged.fetch_add(records, Ordering::Relaxed);
        self.reclaimed_dirs.fetch_add(dirs, Ordering::Relaxed);
    }

    pub fn record_cleanup_error(&self) {
        self.record_cleanup_errors(1);
    }

    pub fn record_cleanup_errors(&self, count: u64) {
        self.cleanup_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            inline_writes: self.inline_writes.load(Ordering::Relaxed),
            blob_writes: self.blob_writes.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
            reclaimed_dirs: self.reclaimed_dirs.load(Ordering::Relaxed),
            cleanup_errors: self.cleanup_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub inline_writes: u64,
    pub blob_writes: u64,
    pub removals: u64,
    pub evictions: u64,
    pub purged: u64,
    pub reclaimed_dirs: u64,
    /// Best-effort cleanup failures that were logged and swallowed
    pub cleanup_errors: u64,
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
