//! Purge and teardown

use crate::core::types::Cache;
use crate::errors::Result;
use crate::purge::PurgeReport;

impl Cache {
    /// Remove records stale for longer than the grace period.
    ///
    /// Returns the number of records removed.
    pub fn purge(&self) -> Result<usize> {
        Ok(self.purge_report()?.records)
    }

    /// Like [`Cache::purge`], with blob and directory counts
    pub fn purge_report(&self) -> Result<PurgeReport> {
        let now = self.inner.clock.now();
        let report = self
            .inner
            .purge
            .run(&self.inner.metadata, &self.inner.blobs, &self.inner.locks, now)?;

        self.inner
            .stats
            .record_purge(report.records as u64, report.dirs_removed as u64);
        self.inner
            .stats
            .record_cleanup_errors(report.cleanup_errors as u64);

        Ok(report)
    }

    /// Remove the persisted metadata store.
    ///
    /// A no-op for in-memory and transient locations. Afterwards every
    /// operation on a persistent cache fails with `StoreUnavailable`. Blob
    /// files are left in place.
    pub fn destroy(&self) -> Result<()> {
        if self.inner.metadata.destroy()? {
            tracing::info!("Destroyed cache metadata at {}", self.inner.metadata.location());
        }
        Ok(())
    }
}
