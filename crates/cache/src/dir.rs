//! Directory-backed artifact cache
//!
//! Artifacts live at `<root>/<shard>/<key>` where the shard is the first two
//! characters of the rule key. Stores go through a temporary file in the shard
//! directory and are renamed into place, so readers never see a partial artifact.

use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use crate::traits::{ArtifactCache, CacheResult};
use stash_config::CacheMode;
use stash_core::RuleKey;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// A local artifact cache rooted at a directory
#[derive(Debug)]
pub struct DirArtifactCache {
    root: PathBuf,
    mode: CacheMode,
    closed: AtomicBool,
}

impl DirArtifactCache {
    /// Open a cache at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>, mode: CacheMode) -> Result<Self> {
        let root = root.into();

        if let Err(e) = fs::create_dir_all(&root) {
            return Err(CacheError::StoreUnavailable {
                store_type: StoreType::FileSystem,
                reason: format!("cannot create cache directory '{}': {e}", root.display()),
                recovery_hint: RecoveryHint::CheckPermissions { path: root },
            });
        }

        if !root.is_dir() {
            return Err(CacheError::StoreUnavailable {
                store_type: StoreType::FileSystem,
                reason: format!("'{}' is not a directory", root.display()),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }

        debug!(root = %root.display(), mode = %mode, "Opened directory cache");

        Ok(Self {
            root,
            mode,
            closed: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Location of the artifact for `key`
    pub fn artifact_path(&self, key: &RuleKey) -> PathBuf {
        self.root.join(key.shard()).join(key.as_str())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CacheError::closed(self.name()));
        }
        Ok(())
    }

    fn io_error(
        path: &Path,
        operation: &'static str,
        source: io::Error,
        recovery_hint: RecoveryHint,
    ) -> CacheError {
        CacheError::Io {
            path: path.to_path_buf(),
            operation,
            source,
            recovery_hint,
        }
    }
}

impl ArtifactCache for DirArtifactCache {
    fn name(&self) -> &str {
        "dir"
    }

    fn fetch(&self, key: &RuleKey, output: &Path) -> Result<CacheResult> {
        self.ensure_open()?;

        if !self.mode.is_readable() {
            trace!(key = %key, mode = %self.mode, "Cache is not readable, skipping fetch");
            return Ok(CacheResult::Skipped);
        }

        let source = self.artifact_path(key);
        if !source.is_file() {
            return Ok(CacheResult::Miss);
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Self::io_error(
                    parent,
                    "create output directory",
                    e,
                    RecoveryHint::CheckPermissions {
                        path: parent.to_path_buf(),
                    },
                )
            })?;
        }

        match fs::copy(&source, output) {
            Ok(_) => Ok(CacheResult::Hit { source }),
            // Evicted between the existence check and the copy
            Err(e) if e.kind() == io::ErrorKind::NotFound && !source.exists() => {
                Ok(CacheResult::Miss)
            }
            Err(e) => Err(Self::io_error(
                output,
                "copy artifact out of cache",
                e,
                RecoveryHint::CheckPermissions {
                    path: output.to_path_buf(),
                },
            )),
        }
    }

    fn store(&self, key: &RuleKey, artifact: &Path) -> Result<()> {
        self.ensure_open()?;

        if !self.mode.is_writable() {
            trace!(key = %key, mode = %self.mode, "Cache is not writable, skipping store");
            return Ok(());
        }

        let mut input = fs::File::open(artifact).map_err(|e| {
            Self::io_error(
                artifact,
                "open artifact",
                e,
                RecoveryHint::Manual {
                    instructions: "Check that the artifact exists and is readable".to_string(),
                },
            )
        })?;

        let shard_dir = self.root.join(key.shard());
        fs::create_dir_all(&shard_dir).map_err(|e| {
            Self::io_error(
                &shard_dir,
                "create shard directory",
                e,
                RecoveryHint::CheckPermissions {
                    path: shard_dir.clone(),
                },
            )
        })?;

        let mut temp = NamedTempFile::new_in(&shard_dir).map_err(|e| {
            Self::io_error(
                &shard_dir,
                "create temporary file",
                e,
                RecoveryHint::CheckPermissions {
                    path: shard_dir.clone(),
                },
            )
        })?;

        io::copy(&mut input, temp.as_file_mut()).map_err(|e| {
            Self::io_error(
                temp.path(),
                "write artifact",
                e,
                RecoveryHint::Retry {
                    after: std::time::Duration::from_millis(100),
                },
            )
        })?;

        let destination = self.artifact_path(key);
        temp.persist(&destination).map_err(|e| {
            Self::io_error(
                &destination,
                "rename artifact into place",
                e.error,
                RecoveryHint::CheckPermissions {
                    path: destination.clone(),
                },
            )
        })?;

        trace!(key = %key, path = %destination.display(), "Stored artifact");
        Ok(())
    }

    fn is_store_supported(&self) -> bool {
        self.mode.is_writable()
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(root = %self.root.display(), "Closed directory cache");
        }
        Ok(())
    }
}
