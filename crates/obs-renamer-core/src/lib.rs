//! OBS Renamer Core Library
//!
//! Watches an OBS Studio instance over obs-websocket, supervises the
//! connection with bounded reconnection, and runs an operator-driven rename
//! of each completed recording.
//!
//! # Example
//!
//! ```no_run
//! use obs_renamer_core::{
//!     ChannelPrompt, CoreResult, Endpoint, LocalFileSystem, Monitor, Notification, Notifier,
//!     ObsConnector, RenameWorkflow, SupervisorConfig,
//! };
//!
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let (tx, mut rx) = mpsc::channel(32);
//!     let notifier = Notifier::new(tx);
//!     let workflow = RenameWorkflow::new(LocalFileSystem, ChannelPrompt::new(notifier.clone()));
//!     let monitor = Monitor::new(
//!         ObsConnector::new(),
//!         Endpoint::new("localhost", 4455, None),
//!         SupervisorConfig::default(),
//!         workflow,
//!         notifier,
//!     );
//!
//!     monitor.start_monitoring().await?;
//!
//!     while let Some(notification) = rx.recv().await {
//!         if let Notification::RenamePrompt(prompt) = notification {
//!             prompt.respond(Some("session-42".to_string()));
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod monitor;
mod notification;
mod obs;
mod recording;
mod rename;
mod session;
mod supervisor;

pub use {
    error::{ConnectionErrorKind, CoreError, IoErrorKind, Result as CoreResult},
    monitor::Monitor,
    notification::{Notification, Notifier},
    obs::ObsConnector,
    recording::{RECORD_STATE_CHANGED, RecordingPhase, RecordingTracker, TrackerSignal},
    rename::{
        ChannelPrompt, FileSystem, LocalFileSystem, PromptRequest, RenameOutcome, RenamePrompt,
        RenameRequest, RenameWorkflow,
    },
    session::{Connector, Endpoint, EventHandler, InboundEvent, Link, SessionClient, SessionId},
    supervisor::{
        ConnectionState, ConnectionStatus, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL,
        DEFAULT_RECONNECT_DELAY, MAX_RECONNECT_ATTEMPTS, MonitoringState, Supervisor,
        SupervisorConfig,
    },
};

#[cfg(test)]
mod tests;
