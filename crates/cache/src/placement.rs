//! Inline-vs-blob placement policy

use crate::blob::{BlobRef, BlobStore};
use crate::errors::Result;
use crate::record::Storage;

/// Where a value of a given size goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Inline,
    Blob,
}

/// Decides, per write, whether a value lives in the metadata row or in a blob file
#[derive(Debug, Clone, Copy)]
pub struct PlacementPolicy {
    inline_threshold: usize,
}

impl PlacementPolicy {
    pub fn new(inline_threshold: usize) -> Self {
        Self { inline_threshold }
    }

    pub fn inline_threshold(&self) -> usize {
        self.inline_threshold
    }

    /// Values strictly longer than the threshold become blobs
    pub fn decide(&self, len: usize) -> Placement {
        if len > self.inline_threshold {
            Placement::Blob
        } else {
            Placement::Inline
        }
    }

    /// Produce the storage for `value`, writing the blob file first when needed.
    ///
    /// The blob is fully written before this returns, so the metadata row that
    /// links to it is only ever inserted after its bytes exist.
    pub fn place(&self, blobs: &BlobStore, key: &str, value: &[u8]) -> Result<Storage> {
        match self.decide(value.len()) {
            Placement::Inline => Ok(Storage::Inline(value.to_vec())),
            Placement::Blob => {
                let blob = BlobRef::for_key(key);
                let path = blobs.write(&blob, value)?;
                tracing::debug!(
                    "Stored {} bytes for '{}' as blob {}",
                    value.len(),
                    key,
                    path.display()
                );
                Ok(Storage::Blob(blob))
            }
        }
    }
}
