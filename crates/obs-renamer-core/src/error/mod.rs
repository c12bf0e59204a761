use std::{
    io,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use thiserror::Error;

/// Classification of connection failures reported to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The remote end actively refused the connection.
    Refused,
    /// The remote end rejected the credential.
    AuthFailed,
    /// The connection did not complete in time.
    Timeout,
    /// Any other transport failure.
    Unknown,
}

/// Classification of filesystem failures reported to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    /// The path does not exist.
    NotFound,
    /// The operating system denied access.
    PermissionDenied,
    /// Any other filesystem failure.
    Unknown,
}

/// Core errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The remote end refused the connection.
    #[error("Connection refused by {endpoint}: {reason} {location}")]
    ConnectionRefused {
        /// Endpoint that was dialled (`host:port`).
        endpoint: String,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The credential was rejected during the handshake.
    #[error("Authentication rejected by {endpoint}: {reason} {location}")]
    AuthFailed {
        /// Endpoint that was dialled (`host:port`).
        endpoint: String,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The connection attempt exceeded its time limit.
    #[error("Connection to {endpoint} timed out: {reason} {location}")]
    ConnectionTimeout {
        /// Endpoint that was dialled (`host:port`).
        endpoint: String,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The connection failed for a reason that has no dedicated kind.
    #[error("Connection to {endpoint} failed: {reason} {location}")]
    ConnectionFailed {
        /// Endpoint that was dialled (`host:port`).
        endpoint: String,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An operation required an open session and none exists.
    #[error("No open session {location}")]
    NotConnected {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Monitoring was stopped before the pending operation completed.
    #[error("Monitoring stopped {location}")]
    MonitoringStopped {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording file is missing.
    #[error("Recording file not found: {path:?} {location}")]
    FileNotFound {
        /// Path that was expected to exist.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The operating system denied the rename.
    #[error("Permission denied renaming {path:?}: {reason} {location}")]
    PermissionDenied {
        /// Path being renamed.
        path: PathBuf,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A file already occupies the rename target.
    #[error("Rename target already exists: {path:?} {location}")]
    TargetExists {
        /// The occupied target path.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The operator supplied a name that cannot be used as a base name.
    #[error("Invalid file name {name:?}: {reason} {location}")]
    InvalidFileName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The rename failed for a reason that has no dedicated kind.
    #[error("Rename of {path:?} failed: {reason} {location}")]
    RenameFailed {
        /// Path being renamed.
        path: PathBuf,
        /// Underlying cause text.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An inbound event did not have the expected shape.
    #[error("Malformed event: {reason} {location}")]
    MalformedEvent {
        /// Description of what was wrong with the payload.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Connection failure kind, if this is a connection error.
    pub fn connection_kind(&self) -> Option<ConnectionErrorKind> {
        match self {
            CoreError::ConnectionRefused { .. } => Some(ConnectionErrorKind::Refused),
            CoreError::AuthFailed { .. } => Some(ConnectionErrorKind::AuthFailed),
            CoreError::ConnectionTimeout { .. } => Some(ConnectionErrorKind::Timeout),
            CoreError::ConnectionFailed { .. } => Some(ConnectionErrorKind::Unknown),
            _ => None,
        }
    }

    /// Filesystem failure kind, if this is a filesystem error.
    pub fn io_kind(&self) -> Option<IoErrorKind> {
        match self {
            CoreError::FileNotFound { .. } => Some(IoErrorKind::NotFound),
            CoreError::PermissionDenied { .. } => Some(IoErrorKind::PermissionDenied),
            CoreError::TargetExists { .. }
            | CoreError::InvalidFileName { .. }
            | CoreError::RenameFailed { .. } => Some(IoErrorKind::Unknown),
            _ => None,
        }
    }

    /// Map a filesystem error raised while renaming `from` to `to`.
    /// A collision names `to`; every other failure names `from`.
    #[track_caller]
    pub(crate) fn from_rename(from: &Path, to: &Path, source: io::Error) -> Self {
        let location = ErrorLocation::from(Location::caller());
        let path = from.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => CoreError::FileNotFound { path, location },
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied {
                path,
                reason: source.to_string(),
                location,
            },
            io::ErrorKind::AlreadyExists => CoreError::TargetExists {
                path: to.to_path_buf(),
                location,
            },
            _ => CoreError::RenameFailed {
                path,
                reason: source.to_string(),
                location,
            },
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
