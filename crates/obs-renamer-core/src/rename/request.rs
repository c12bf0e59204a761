use crate::{CoreError, CoreResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;

/// A pending rename of one completed recording.
///
/// The original extension is always kept; the operator only chooses the
/// base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    original: PathBuf,
    default_name: String,
    new_name: Option<String>,
}

impl RenameRequest {
    /// Start a request for `original`, defaulting to its current base name.
    pub fn new(original: impl Into<PathBuf>) -> Self {
        let original = original.into();
        let default_name = original
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            original,
            default_name,
            new_name: None,
        }
    }

    /// Path of the recording as produced.
    pub fn original(&self) -> &Path {
        &self.original
    }

    /// Base name without extension offered to the operator.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Base name chosen by the operator, if any.
    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }

    /// Record the operator's answer. Blank answers count as no answer.
    pub fn with_new_name(mut self, answer: Option<String>) -> Self {
        self.new_name = answer
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self
    }

    /// Path the recording should be moved to, or `None` when nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFileName` if the chosen name would escape the
    /// recording's directory.
    #[track_caller]
    pub fn target(&self) -> CoreResult<Option<PathBuf>> {
        let Some(name) = self.new_name.as_deref() else {
            return Ok(None);
        };

        if name == self.default_name {
            return Ok(None);
        }

        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(CoreError::InvalidFileName {
                name: name.to_string(),
                reason: "must be a plain name without path separators".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let file_name = match self.original.extension() {
            Some(ext) => format!("{name}.{}", ext.to_string_lossy()),
            None => name.to_string(),
        };

        Ok(Some(self.original.with_file_name(file_name)))
    }
}
