//! Cache operations, implemented directly on [`Cache`](super::Cache)

mod maintenance;
mod read;
mod remove;
mod write;

use crate::blob::BlobRef;
use crate::core::types::Cache;
use crate::locks::{self, OrphanOutcome};

impl Cache {
    /// Delete a blob whose record is already gone. The caller holds the key's
    /// stripe. Failures are logged, not returned.
    pub(super) fn discard_blob(&self, key: &str, blob: &BlobRef) {
        match self.inner.blobs.delete(blob) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Blob {} for '{}' was already gone", blob, key);
            }
            Err(e) => {
                self.inner.stats.record_cleanup_error();
                tracing::warn!("Failed to remove blob {} for '{}': {}", blob, key, e);
            }
        }
    }

    /// Like [`Cache::discard_blob`] for a key whose stripe the caller does not
    /// hold; the file is kept if the key has been written again.
    pub(super) fn discard_orphan(&self, key: &str, blob: &BlobRef) {
        let inner = &self.inner;
        match locks::remove_orphan(&inner.locks, &inner.metadata, &inner.blobs, key, blob) {
            Ok(OrphanOutcome::Removed) => {}
            Ok(OrphanOutcome::AlreadyGone) => {
                tracing::debug!("Blob {} for '{}' was already gone", blob, key);
            }
            Ok(OrphanOutcome::StillReferenced) => {
                tracing::debug!("Keeping blob {} for '{}', written again", blob, key);
            }
            Err(e) => {
                inner.stats.record_cleanup_error();
                tracing::warn!("Failed to remove blob {} for '{}': {}", blob, key, e);
            }
        }
    }
}
