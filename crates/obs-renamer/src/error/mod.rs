use obs_renamer_core::CoreError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the obs-renamer binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from obs-renamer-core.
    #[error("Core error: {source} {location}")]
    Core {
        /// The underlying core error.
        #[source]
        source: CoreError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading, validation or saving error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// A console line could not be parsed into a command.
    #[error("Invalid command {input:?}: {reason} {location}")]
    InvalidCommand {
        /// The line as typed.
        input: String,
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to send message through async channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem or terminal operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// Manual From<CoreError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<CoreError> for AppError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        AppError::Core {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
