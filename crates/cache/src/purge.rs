//! Removal of records past TTL plus grace period

use serde::Serialize;
use std::time::Duration;

use crate::blob::BlobStore;
use crate::errors::Result;
use crate::locks::{self, KeyLocks, OrphanOutcome};
use crate::metadata::MetadataStore;

/// Outcome of one purge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PurgeReport {
    /// `now - grace`; records expiring strictly before this were removed
    pub cutoff: f64,
    /// Metadata records deleted
    pub records: usize,
    /// Blob files deleted
    pub blobs_removed: usize,
    /// Empty blob directories reclaimed
    pub dirs_removed: usize,
    /// Blob deletions that failed and were skipped
    pub cleanup_errors: usize,
}

/// Deletes records stale for longer than the grace period, then their blobs,
/// then any blob directories left empty
#[derive(Debug, Clone, Copy)]
pub struct PurgeEngine {
    grace_period: Duration,
}

impl PurgeEngine {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn cutoff(&self, now: f64) -> f64 {
        now - self.grace_period.as_secs_f64()
    }

    /// Blob files are removed only after the row deletions commit, each under
    /// its key's write lock, and kept when the key was written again meanwhile.
    pub fn run(
        &self,
        metadata: &MetadataStore,
        blobs: &BlobStore,
        locks: &KeyLocks,
        now: f64,
    ) -> Result<PurgeReport> {
        let cutoff = self.cutoff(now);

        let (doomed_blobs, records) = metadata.transaction(|records| {
            let doomed = records.expired_blobs_before(cutoff)?;
            let deleted = records.delete_expired_before(cutoff)?;
            Ok((doomed, deleted))
        })?;

        let mut report = PurgeReport {
            cutoff,
            records,
            ..PurgeReport::default()
        };

        for (key, blob) in &doomed_blobs {
            match locks::remove_orphan(locks, metadata, blobs, key, blob) {
                Ok(OrphanOutcome::Removed) => report.blobs_removed += 1,
                Ok(OrphanOutcome::AlreadyGone) => {
                    tracing::debug!("Blob for purged key '{}' was already gone", key);
                }
                Ok(OrphanOutcome::StillReferenced) => {
                    tracing::debug!("Purged key '{}' was written again, keeping its blob", key);
                }
                Err(e) => {
                    report.cleanup_errors += 1;
                    tracing::warn!("Failed to remove blob for purged key '{}': {}", key, e);
                }
            }
        }

        report.dirs_removed = blobs.reclaim_empty_dirs();

        if report.records > 0 {
            tracing::info!(
                "Purged {} expired records ({} blobs, {} empty directories)",
                report.records,
                report.blobs_removed,
                report.dirs_removed
            );
        } else {
            tracing::debug!("Purge found nothing older than {:.3}", cutoff);
        }

        Ok(report)
    }
}
