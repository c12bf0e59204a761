//! Wires the supervisor, recording tracker and rename workflow together
//! behind the calls the control surface makes.

use crate::{
    ConnectionState, ConnectionStatus, Connector, CoreResult, Endpoint, EventHandler, FileSystem,
    InboundEvent, Notification, Notifier, RECORD_STATE_CHANGED, RecordingPhase, RecordingTracker,
    RenamePrompt, RenameWorkflow, Supervisor, SupervisorConfig, TrackerSignal,
};

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// Completed recordings waiting for the rename worker.
const COMPLETED_QUEUE_CAPACITY: usize = 16;

type SharedTracker = Arc<Mutex<RecordingTracker>>;

/// Recording monitor: one supervisor, one tracker, one rename worker.
///
/// Renames are serialized through a single worker task, so at most one
/// prompt is open at a time. Must be created inside a tokio runtime.
pub struct Monitor<C> {
    supervisor: Supervisor<C>,
    tracker: SharedTracker,
    rename_worker: JoinHandle<()>,
}

impl<C: Connector> Monitor<C> {
    /// Wire up a stopped monitor.
    pub fn new<F: FileSystem, P: RenamePrompt>(
        connector: C,
        endpoint: Endpoint,
        config: SupervisorConfig,
        workflow: RenameWorkflow<F, P>,
        notifier: Notifier,
    ) -> Self {
        let supervisor = Supervisor::new(connector, endpoint, config, notifier.clone());
        let tracker: SharedTracker = Arc::default();
        let (completed_tx, completed_rx) = mpsc::channel(COMPLETED_QUEUE_CAPACITY);

        supervisor.subscribe(
            RECORD_STATE_CHANGED,
            recording_handler(Arc::clone(&tracker), completed_tx, notifier.clone()),
        );

        let rename_worker = tokio::spawn(rename_worker(
            workflow,
            completed_rx,
            Arc::clone(&tracker),
            notifier,
        ));

        Self {
            supervisor,
            tracker,
            rename_worker,
        }
    }

    /// Connect and begin supervising.
    ///
    /// # Errors
    ///
    /// Returns the initial connect error; monitoring is then `Failed`.
    pub async fn start_monitoring(&self) -> CoreResult<()> {
        self.supervisor.start().await
    }

    /// Stop supervising and close the session.
    pub async fn stop_monitoring(&self) {
        self.supervisor.stop().await;
    }

    /// Apply new connection settings, reconnecting if monitoring is active.
    ///
    /// # Errors
    ///
    /// Returns the connect error from the reconnect, if one happened.
    pub async fn update_settings(&self, endpoint: Endpoint) -> CoreResult<()> {
        self.supervisor.update_settings(endpoint).await
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Current connection status with display text.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.supervisor.status()
    }

    /// Current recording phase.
    pub fn recording_phase(&self) -> RecordingPhase {
        lock(&self.tracker).phase().clone()
    }

    /// The underlying supervisor.
    pub fn supervisor(&self) -> &Supervisor<C> {
        &self.supervisor
    }

    /// Stop monitoring and the rename worker.
    #[instrument(skip(self))]
    pub async fn shutdown(self) {
        self.supervisor.stop().await;
        self.rename_worker.abort();
        info!("Monitor shut down");
    }
}

impl<C> Drop for Monitor<C> {
    fn drop(&mut self) {
        self.rename_worker.abort();
    }
}

/// Handler run on the delivery task for every `RecordStateChanged` event.
fn recording_handler(
    tracker: SharedTracker,
    completed_tx: mpsc::Sender<PathBuf>,
    notifier: Notifier,
) -> EventHandler {
    Arc::new(move |event: &InboundEvent| {
        let signal = match lock(&tracker).observe(event) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed recording event");
                return;
            }
        };

        match signal {
            Some(TrackerSignal::InProgress) => {
                notifier.notify(Notification::Recording(RecordingPhase::InProgress));
            }
            Some(TrackerSignal::Completed(path)) => {
                info!(path = ?path, "Recording completed");
                notifier.notify(Notification::Recording(RecordingPhase::Completed(
                    path.clone(),
                )));

                if let Err(e) = completed_tx.try_send(path) {
                    let path = e.into_inner();
                    error!(path = ?path, "Rename queue unavailable, skipping rename");
                    lock(&tracker).conclude(&path);
                }
            }
            None => {}
        }
    })
}

/// Run the rename workflow for each completed recording, one at a time.
async fn rename_worker<F: FileSystem, P: RenamePrompt>(
    workflow: RenameWorkflow<F, P>,
    mut completed_rx: mpsc::Receiver<PathBuf>,
    tracker: SharedTracker,
    notifier: Notifier,
) {
    while let Some(path) = completed_rx.recv().await {
        let result = workflow.run(&path).await;

        if let Err(e) = &result {
            warn!(path = ?path, error = %e, "Rename failed");
        }

        let phase = {
            let mut tracker = lock(&tracker);
            tracker.conclude(&path);
            tracker.phase().clone()
        };

        let delivered = notifier
            .deliver(Notification::RenameOutcome {
                original: path,
                result,
            })
            .await;
        if !delivered {
            debug!("Rename outcome not delivered, no listener");
        }
        notifier.notify(Notification::Recording(phase));
    }
}

fn lock(tracker: &Mutex<RecordingTracker>) -> MutexGuard<'_, RecordingTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}
