use std::path::PathBuf;

/// Tracked state of the remote recording process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecordingPhase {
    /// No recording running and none awaiting a rename.
    #[default]
    Idle,
    /// The remote application is recording.
    InProgress,
    /// A recording finished and its file is awaiting the rename workflow.
    Completed(PathBuf),
}
