//! Archive storage capability
//!
//! An [`ArchiveSink`] durably stores one media item under a suggested name and hands back
//! a stable reference. [`LocalDirSink`] writes into a directory tree; cloud backends
//! implement the same trait outside this crate.

use crate::error::SinkError;
use crate::media::DownloadedMedia;
use crate::types::StorageRef;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Pluggable durable storage capability
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Store `media` under `suggested_name` and return where it ended up
    async fn store(
        &self,
        media: &DownloadedMedia,
        suggested_name: &str,
    ) -> Result<StorageRef, SinkError>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "archive-sink"
    }
}

/// Sink that writes files below a root directory
///
/// Files are written to a `.part` sibling first and renamed into place, so a crash never
/// leaves a truncated file under the final name. Storing a name that already exists is a
/// no-op that returns the existing reference.
#[derive(Clone, Debug)]
pub struct LocalDirSink {
    root: PathBuf,
}

impl LocalDirSink {
    /// Create a sink rooted at `root` (created on first store)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, suggested_name: &str) -> Result<PathBuf, SinkError> {
        let relative = Path::new(suggested_name);
        let is_safe = !suggested_name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_safe {
            return Err(SinkError::InvalidName(suggested_name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io_error(e: std::io::Error, target: &Path) -> SinkError {
    match e.kind() {
        std::io::ErrorKind::StorageFull => {
            SinkError::QuotaExceeded(format!("{}: {}", target.display(), e))
        }
        _ => SinkError::SinkUnavailable(format!("{}: {}", target.display(), e)),
    }
}

#[async_trait]
impl ArchiveSink for LocalDirSink {
    async fn store(
        &self,
        media: &DownloadedMedia,
        suggested_name: &str,
    ) -> Result<StorageRef, SinkError> {
        let target = self.resolve(suggested_name)?;

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!(path = %target.display(), "Archive target already exists");
            return Ok(StorageRef(suggested_name.to_string()));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(e, parent))?;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(e) = tokio::fs::write(&partial, &media.bytes).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(map_io_error(e, &partial));
        }
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|e| map_io_error(e, &target))?;

        tracing::debug!(
            path = %target.display(),
            size = media.bytes.len(),
            "Media stored"
        );
        Ok(StorageRef(suggested_name.to_string()))
    }

    fn name(&self) -> &str {
        "local-dir"
    }
}
