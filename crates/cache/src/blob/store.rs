//! Byte-level read/write/delete for blob files

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;
use walkdir::WalkDir;

use super::paths::BlobRef;
use crate::errors::{CacheError, RecoveryHint, Result};

/// Filesystem store for blob-backed values
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, blob: &BlobRef) -> PathBuf {
        blob.resolve(&self.root)
    }

    /// Write a blob, replacing any previous content at the same location.
    ///
    /// Bytes go to a temporary sibling first and are renamed into place, so a
    /// reader never sees a partially written blob.
    pub fn write(&self, blob: &BlobRef, data: &[u8]) -> Result<PathBuf> {
        let path = self.path_of(blob);
        let parent = match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(CacheError::Configuration {
                    message: format!("Blob path '{}' has no parent", path.display()),
                    recovery_hint: RecoveryHint::UpdateConfiguration,
                });
            }
        };

        fs::create_dir_all(&parent).map_err(|e| CacheError::Io {
            path: parent.clone(),
            operation: "create blob directory",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: parent.clone(),
            },
        })?;

        let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

        let written = (|| -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::Io {
                path: temp_path,
                operation: "write blob",
                source: e,
                recovery_hint: RecoveryHint::CheckDiskSpace,
            });
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::Io {
                path,
                operation: "rename blob into place",
                source: e,
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_millis(10),
                },
            });
        }

        Ok(path)
    }

    pub fn read(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let path = self.path_of(blob);
        fs::read(&path).map_err(|e| {
            let recovery_hint = if e.kind() == ErrorKind::NotFound {
                RecoveryHint::ClearAndRetry
            } else {
                RecoveryHint::CheckPermissions { path: path.clone() }
            };
            CacheError::Io {
                path,
                operation: "read blob",
                source: e,
                recovery_hint,
            }
        })
    }

    /// Delete a blob. Returns `Ok(false)` when it was already gone.
    pub fn delete(&self, blob: &BlobRef) -> Result<bool> {
        let path = self.path_of(blob);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path: path.clone(),
                operation: "delete blob",
                source: e,
                recovery_hint: RecoveryHint::CheckPermissions { path },
            }),
        }
    }

    /// Remove every directory below the root that is empty once its own
    /// children have been cleaned. The root itself is kept.
    ///
    /// Failures are logged and skipped. Returns the number of directories removed.
    pub fn reclaim_empty_dirs(&self) -> usize {
        let mut removed = 0;

        // contents_first visits children before their parent
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .contents_first(true)
            .follow_links(false)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable blob tree entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let is_empty = match fs::read_dir(path) {
                Ok(mut children) => children.next().is_none(),
                Err(_) => false,
            };
            if !is_empty {
                continue;
            }

            match fs::remove_dir(path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::debug!("Failed to remove empty blob directory {}: {}", path.display(), e);
                }
            }
        }

        removed
    }
}
