//! Cache records and the inline/blob storage duality

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blob::BlobRef;

/// Where a record's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Bytes stored directly in the metadata row
    Inline(Vec<u8>),
    /// Bytes stored in a sharded blob file
    Blob(BlobRef),
}

impl Storage {
    /// The blob reference, if this storage is blob-backed
    pub fn blob_ref(&self) -> Option<&BlobRef> {
        match self {
            Self::Inline(_) => None,
            Self::Blob(blob) => Some(blob),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// One cached key
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub key: String,
    pub storage: Storage,
    /// Seconds since the UNIX epoch after which the record is stale
    pub expire_at: f64,
    /// Seconds since the UNIX epoch of creation or last read
    pub last_access_at: f64,
}

impl CacheRecord {
    /// Build a record written at `now` that expires `ttl_secs` later
    pub fn new(key: impl Into<String>, storage: Storage, now: f64, ttl_secs: f64) -> Self {
        Self {
            key: key.into(),
            storage,
            expire_at: now + ttl_secs,
            last_access_at: now,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.expire_at <= now
    }
}

/// Result of a freshness query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Present and not yet past its TTL
    Hit,
    /// Present but past its TTL; still readable until purged
    Stale,
    /// No record for the key
    Miss,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stale => "stale",
            Self::Miss => "miss",
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
