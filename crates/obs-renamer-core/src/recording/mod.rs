mod phase;
mod tracker;

pub use {
    phase::RecordingPhase,
    tracker::{RECORD_STATE_CHANGED, RecordingTracker, TrackerSignal},
};
