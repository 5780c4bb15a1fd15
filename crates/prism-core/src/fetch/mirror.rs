//! Local on-disk copies of origin assets.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::RenderError;

/// Mirror directory layout and file access.
///
/// Writes are neither atomic nor synced; a torn file is caught by the decode
/// step on the next read and removed.
#[derive(Debug, Clone)]
pub struct Mirror {
    base_dir: PathBuf,
}

impl Mirror {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Mirror path of a resource: `:` becomes `_`, rooted at the base dir.
    ///
    /// Returns `None` for empty resources and for any that would climb out
    /// of the base directory.
    pub fn path_for(&self, resource: &str) -> Option<PathBuf> {
        let relative = resource.replace(':', "_");
        let relative = Path::new(relative.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return None;
        }
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.base_dir.join(relative))
    }

    /// Read a mirrored file. Missing or unreadable files are a miss.
    pub async fn read(&self, path: &Path) -> Option<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot read mirror file: {e}");
                None
            }
        }
    }

    /// Delete a mirrored file. Failures are logged and otherwise ignored.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed mirror file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Cannot remove mirror file: {e}"),
        }
    }

    /// Persist fetched bytes, creating parent directories as needed.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
        let to_error = |source| RenderError::MirrorWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
        }
        tokio::fs::write(path, bytes).await.map_err(to_error)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote mirror file");
        Ok(())
    }
}
