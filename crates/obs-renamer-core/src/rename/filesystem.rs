use crate::{CoreError, CoreResult};

use std::{fs, path::Path};

/// Filesystem operations the rename workflow needs.
pub trait FileSystem: Send + Sync + 'static {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Move `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound`, `PermissionDenied`, `TargetExists` or
    /// `RenameFailed` depending on the underlying failure.
    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[track_caller]
    fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        fs::rename(from, to).map_err(|e| CoreError::from_rename(from, to, e))
    }
}
