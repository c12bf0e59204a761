//! Maps `RecordStateChanged` events onto [`RecordingPhase`] transitions.

use crate::{CoreError, CoreResult, InboundEvent, RecordingPhase};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use serde::Deserialize;
use tracing::debug;

/// Event kind carrying recording output state changes.
pub const RECORD_STATE_CHANGED: &str = "RecordStateChanged";

const OUTPUT_STARTING: &str = "OBS_WEBSOCKET_OUTPUT_STARTING";
const OUTPUT_STARTED: &str = "OBS_WEBSOCKET_OUTPUT_STARTED";
const OUTPUT_STOPPED: &str = "OBS_WEBSOCKET_OUTPUT_STOPPED";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordStateChanged {
    output_state: String,
    #[serde(default)]
    output_path: Option<String>,
}

/// Notification raised by a phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerSignal {
    /// Recording is running. Informational; may repeat.
    InProgress,
    /// Recording finished; the file at this path is ready to rename.
    /// Raised once per transition into [`RecordingPhase::Completed`].
    Completed(PathBuf),
}

/// Recording state machine driven only by inbound events.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    phase: RecordingPhase,
}

impl RecordingTracker {
    /// Create a tracker in [`RecordingPhase::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> &RecordingPhase {
        &self.phase
    }

    /// Apply one inbound event.
    ///
    /// Unknown event kinds and output states are ignored. A stop event for
    /// the path already in `Completed` is a duplicate and raises nothing.
    ///
    /// # Errors
    ///
    /// Returns `MalformedEvent` if a `RecordStateChanged` payload lacks
    /// `outputState`, or a stop event lacks `outputPath`. The phase is left
    /// unchanged.
    #[track_caller]
    pub fn observe(&mut self, event: &InboundEvent) -> CoreResult<Option<TrackerSignal>> {
        if event.kind != RECORD_STATE_CHANGED {
            return Ok(None);
        }

        let payload: RecordStateChanged =
            serde_json::from_value(event.data.clone()).map_err(|e| CoreError::MalformedEvent {
                reason: format!("{RECORD_STATE_CHANGED}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match payload.output_state.as_str() {
            OUTPUT_STARTING | OUTPUT_STARTED => Ok(self.on_started()),
            OUTPUT_STOPPED => {
                let path = payload
                    .output_path
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .ok_or_else(|| CoreError::MalformedEvent {
                        reason: format!("{RECORD_STATE_CHANGED}: stop event without outputPath"),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                Ok(self.on_stopped(path))
            }
            other => {
                debug!(output_state = other, "Ignoring output state");
                Ok(None)
            }
        }
    }

    /// Return to `Idle` once the rename workflow for `path` has concluded.
    ///
    /// Returns `false` and leaves the phase alone if the tracker has since
    /// moved on to a different recording.
    pub fn conclude(&mut self, path: &Path) -> bool {
        match &self.phase {
            RecordingPhase::Completed(current) if current == path => {
                self.phase = RecordingPhase::Idle;
                true
            }
            _ => false,
        }
    }

    fn on_started(&mut self) -> Option<TrackerSignal> {
        match self.phase {
            RecordingPhase::Idle | RecordingPhase::InProgress => {
                self.phase = RecordingPhase::InProgress;
                Some(TrackerSignal::InProgress)
            }
            // A new recording may start while the previous file awaits its
            // rename; the phase stays terminal until conclude().
            RecordingPhase::Completed(_) => None,
        }
    }

    fn on_stopped(&mut self, path: PathBuf) -> Option<TrackerSignal> {
        if matches!(&self.phase, RecordingPhase::Completed(current) if *current == path) {
            debug!(path = ?path, "Duplicate stop event ignored");
            return None;
        }

        self.phase = RecordingPhase::Completed(path.clone());
        Some(TrackerSignal::Completed(path))
    }
}
