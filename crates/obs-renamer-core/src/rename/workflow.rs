//! Operator-driven rename of a completed recording.

use crate::{CoreError, CoreResult, FileSystem, RenamePrompt, RenameRequest};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{info, instrument};

/// Result of a rename workflow that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The recording now lives at this path.
    Renamed(PathBuf),
    /// The operator kept the original name; nothing was touched.
    Unchanged,
}

/// Prompts for a new base name and applies it.
pub struct RenameWorkflow<F, P> {
    filesystem: F,
    prompt: P,
}

impl<F: FileSystem, P: RenamePrompt> RenameWorkflow<F, P> {
    /// Create a workflow over `filesystem`, asking through `prompt`.
    pub fn new(filesystem: F, prompt: P) -> Self {
        Self { filesystem, prompt }
    }

    /// Rename the recording at `original`.
    ///
    /// The operator is only prompted if the file exists. A blank or
    /// cancelled answer leaves the filesystem untouched.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` before prompting if `original` is missing,
    /// `InvalidFileName` or `TargetExists` for unusable answers, and the
    /// filesystem's error if the rename itself fails.
    #[instrument(skip(self))]
    pub async fn run(&self, original: &Path) -> CoreResult<RenameOutcome> {
        if !self.filesystem.exists(original) {
            return Err(CoreError::FileNotFound {
                path: original.to_path_buf(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let request = RenameRequest::new(original);
        let answer = self.prompt.ask(original, request.default_name()).await;
        let request = request.with_new_name(answer);

        let Some(target) = request.target()? else {
            info!(path = ?original, "Keeping original name");
            return Ok(RenameOutcome::Unchanged);
        };

        if self.filesystem.exists(&target) {
            return Err(CoreError::TargetExists {
                path: target,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.filesystem.rename(original, &target)?;

        info!(from = ?original, to = ?target, "Recording renamed");

        Ok(RenameOutcome::Renamed(target))
    }
}
