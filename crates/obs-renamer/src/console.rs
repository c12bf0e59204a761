//! Terminal control surface: stdin line reader and text rendering.

use crate::{AppError, AppResult};

use obs_renamer_core::{
    ConnectionErrorKind, ConnectionState, ConnectionStatus, CoreError, CoreResult, IoErrorKind,
    Notification, PromptRequest, RecordingPhase, RenameOutcome,
};

use std::{io::Write, panic::Location, path::Path};

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, warn};

pub(crate) const HELP: &str = "\
Commands:
  start                             start monitoring OBS
  stop                              stop monitoring OBS
  status                            show connection and recording state
  settings <host> <port> [password] change and save connection settings
  help                              show this list
  quit                              exit";

/// Writes operator-facing text.
pub struct Console<W> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> AppResult<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        self.out.flush()?;
        Ok(())
    }

    /// Render a core notification. Rename prompts go through
    /// [`prompt`](Self::prompt) instead.
    pub fn notification(&mut self, notification: &Notification) -> AppResult<()> {
        match notification {
            Notification::Connection(status) => self.line(describe_connection(status)),
            Notification::Recording(phase) => {
                self.line(format!("[recording] {}", describe_phase(phase)))
            }
            Notification::RenameOutcome { original, result } => {
                self.line(describe_outcome(original, result))
            }
            Notification::RenamePrompt(request) => self.prompt(request),
        }
    }

    pub fn prompt(&mut self, request: &PromptRequest) -> AppResult<()> {
        write!(
            self.out,
            "Recording finished: {}\nNew name without extension (empty keeps {:?}): ",
            request.original.display(),
            request.default_name
        )?;
        self.out.flush()?;
        Ok(())
    }

    pub fn status(
        &mut self,
        endpoint: &str,
        status: &ConnectionStatus,
        phase: &RecordingPhase,
    ) -> AppResult<()> {
        self.line(format!(
            "OBS:        {endpoint}\n{}\nRecording:  {}",
            describe_connection(status),
            describe_phase(phase)
        ))
    }

    pub fn error(&mut self, error: &AppError) -> AppResult<()> {
        self.line(format!("Error: {}", describe_app_error(error)))
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

pub(crate) fn describe_connection(status: &ConnectionStatus) -> String {
    let state = match status.state {
        ConnectionState::Stopped => "stopped".to_string(),
        ConnectionState::Connecting => "connecting".to_string(),
        ConnectionState::Connected => "connected".to_string(),
        ConnectionState::Reconnecting { attempt } => format!("reconnecting (attempt {attempt})"),
        ConnectionState::Failed => "failed".to_string(),
    };
    format!("[connection] {state}: {}", status.detail)
}

pub(crate) fn describe_phase(phase: &RecordingPhase) -> String {
    match phase {
        RecordingPhase::Idle => "idle".to_string(),
        RecordingPhase::InProgress => "in progress".to_string(),
        RecordingPhase::Completed(path) => format!("completed, awaiting name: {}", path.display()),
    }
}

pub(crate) fn describe_outcome(original: &Path, result: &CoreResult<RenameOutcome>) -> String {
    match result {
        Ok(RenameOutcome::Renamed(target)) => format!(
            "[rename] {} -> {}",
            original.display(),
            target.display()
        ),
        Ok(RenameOutcome::Unchanged) => format!("[rename] kept {}", original.display()),
        Err(e) => format!(
            "[rename] {} not renamed: {}",
            original.display(),
            describe_core_error(e)
        ),
    }
}

/// Operator-facing text for a core error, without source locations.
pub(crate) fn describe_core_error(error: &CoreError) -> String {
    if let Some(kind) = error.connection_kind() {
        return match kind {
            ConnectionErrorKind::Refused => {
                "OBS refused the connection; check that OBS is running with the WebSocket server enabled"
                    .to_string()
            }
            ConnectionErrorKind::AuthFailed => "OBS rejected the password".to_string(),
            ConnectionErrorKind::Timeout => "OBS did not answer in time".to_string(),
            ConnectionErrorKind::Unknown => "could not reach OBS".to_string(),
        };
    }

    match error {
        CoreError::TargetExists { path, .. } => {
            format!("{} already exists", path.display())
        }
        CoreError::InvalidFileName { name, reason, .. } => format!("{name:?} {reason}"),
        _ => match error.io_kind() {
            Some(IoErrorKind::NotFound) => "the recording file no longer exists".to_string(),
            Some(IoErrorKind::PermissionDenied) => "permission denied".to_string(),
            _ => error.to_string(),
        },
    }
}

pub(crate) fn describe_app_error(error: &AppError) -> String {
    match error {
        AppError::Core { source, .. } => describe_core_error(source),
        AppError::ConfigError { reason, .. } | AppError::InvalidCommand { reason, .. } => {
            reason.clone()
        }
        other => other.to_string(),
    }
}

/// Forward stdin lines into `line_tx` until stdin closes or the receiver
/// is dropped.
pub(crate) fn spawn_stdin_reader(line_tx: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match read_lines(line_tx).await {
            Ok(()) => debug!("Stdin closed"),
            Err(AppError::ChannelSendFailed { .. }) => debug!("Console gone, stdin reader stopping"),
            Err(e) => warn!(error = %e, "Stdin reader failed"),
        }
    })
}

async fn read_lines(line_tx: mpsc::Sender<String>) -> AppResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        line_tx
            .send(line)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to forward console line: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
    }

    Ok(())
}
