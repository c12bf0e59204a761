use crate::{ConnectionStatus, CoreResult, PromptRequest, RecordingPhase, RenameOutcome};

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Messages from the core to the control surface.
#[derive(Debug)]
pub enum Notification {
    /// Connection status changed.
    Connection(ConnectionStatus),
    /// Recording phase changed.
    Recording(RecordingPhase),
    /// The operator must choose a name for a completed recording.
    RenamePrompt(PromptRequest),
    /// A rename workflow finished.
    RenameOutcome {
        /// Recording the workflow ran for.
        original: PathBuf,
        /// What happened to it.
        result: CoreResult<RenameOutcome>,
    },
}

/// Sending half of the notification channel.
///
/// Status updates are best-effort: a full or closed channel drops them
/// rather than stalling supervision or event delivery.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<Notification>>,
}

impl Notifier {
    /// Publish into `tx`.
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Publish without waiting.
    pub fn notify(&self, notification: Notification) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(notification = ?dropped, "Notification channel full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("Notification channel closed");
            }
        }
    }

    /// Publish, waiting for channel capacity. Returns `false` if nobody is
    /// listening.
    pub async fn deliver(&self, notification: Notification) -> bool {
        match &self.tx {
            Some(tx) => tx.send(notification).await.is_ok(),
            None => false,
        }
    }
}
