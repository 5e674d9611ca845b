//! Deterministic key-to-path mapping for blob files

use std::fmt;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Suffix of every blob file
pub const BLOB_SUFFIX: &str = "v";

/// Relative location of a blob under the blob root, e.g. `ab/cd/ef0123456789.v`
///
/// Stored in the metadata row with `/` separators regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(String);

impl BlobRef {
    /// Derive the blob location for a key.
    ///
    /// The 64-bit hash is hex-encoded to 16 characters and split into two
    /// 2-character directory levels plus a 12-character file name.
    pub fn for_key(key: &str) -> Self {
        let hash = format!("{:016x}", xxh3_64(key.as_bytes()));
        Self(format!(
            "{}/{}/{}.{BLOB_SUFFIX}",
            &hash[..2],
            &hash[2..4],
            &hash[4..]
        ))
    }

    /// Accept a reference read back from the metadata store.
    ///
    /// Returns `None` unless the value has exactly the shape `for_key` produces,
    /// so a tampered row can never point outside the blob root.
    pub fn parse(stored: &str) -> Option<Self> {
        let mut parts = stored.split('/');
        let (first, second, leaf) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let stem = leaf.strip_suffix(BLOB_SUFFIX)?.strip_suffix('.')?;

        let is_hex = |s: &str, len: usize| {
            s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        };
        if is_hex(first, 2) && is_hex(second, 2) && is_hex(stem, 12) {
            Some(Self(stored.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute path of this blob under `root`
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_deterministic() {
        assert_eq!(BlobRef::for_key("alpha"), BlobRef::for_key("alpha"));
        assert_ne!(BlobRef::for_key("alpha"), BlobRef::for_key("beta"));
    }

    #[test]
    fn test_path_shape() {
        let blob = BlobRef::for_key("some key with spaces / and slashes");
        let parts: Vec<&str> = blob.as_str().split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 12 + 1 + BLOB_SUFFIX.len());
        assert!(parts[2].ends_with(".v"));

        let full = format!("{}{}{}", parts[0], parts[1], &parts[2][..12]);
        assert_eq!(
            full,
            format!("{:016x}", xxh3_64(b"some key with spaces / and slashes"))
        );
    }

    #[test]
    fn test_parse_accepts_derived_refs() {
        let blob = BlobRef::for_key("k");
        assert_eq!(BlobRef::parse(blob.as_str()), Some(blob));
    }

    #[test]
    fn test_parse_rejects_foreign_paths() {
        assert_eq!(BlobRef::parse("../../etc/passwd"), None);
        assert_eq!(BlobRef::parse("ab/cd/0123456789ab.txt"), None);
        assert_eq!(BlobRef::parse("ab/cd/ef/0123456789ab.v"), None);
        assert_eq!(BlobRef::parse("AB/cd/0123456789ab.v"), None);
        assert_eq!(BlobRef::parse("ab/cd/0123.v"), None);
        assert_eq!(BlobRef::parse(""), None);
    }

    #[test]
    fn test_resolve_under_root() {
        let blob = BlobRef::parse("ab/cd/0123456789ab.v").unwrap();
        let path = blob.resolve(Path::new("/var/cache/blobs"));
        assert_eq!(
            path,
            PathBuf::from("/var/cache/blobs/ab/cd/0123456789ab.v")
        );
    }
}
