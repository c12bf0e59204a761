//! Liveness supervisor with bounded reconnection.
//!
//! One background task per start. It performs the initial connect, then
//! polls [`SessionClient::is_alive`] on a fixed interval. A failed initial
//! connect is reported and never retried; a loss after success is retried
//! up to `max_reconnect_attempts` times with `reconnect_delay` between
//! attempts, then reported as [`ConnectionState::Failed`].
//!
//! Stop requests travel over a `watch` channel that every await point in
//! the task selects on, so stopping never waits for an in-flight attempt.

use crate::{
    ConnectionState, ConnectionStatus, Connector, CoreError, CoreResult, Endpoint, EventHandler,
    MonitoringState, Notification, Notifier, SessionClient, SessionId, SupervisorConfig,
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use error_location::ErrorLocation;
use tokio::{
    sync::{Mutex as AsyncMutex, oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};

/// Handle to the liveness supervisor. Cheap to clone.
pub struct Supervisor<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Supervisor<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C> {
    client: SessionClient<C>,
    config: SupervisorConfig,
    endpoint: Mutex<Endpoint>,
    subscriptions: Mutex<Vec<(String, EventHandler)>>,
    monitoring: MonitoringState,
    status_tx: watch::Sender<ConnectionStatus>,
    notifier: Notifier,
    control: AsyncMutex<Control>,
}

/// The running supervision task, if any.
#[derive(Default)]
struct Control {
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

enum Reconnect {
    Restored,
    Cancelled,
    Exhausted(CoreError),
}

impl<C: Connector> Supervisor<C> {
    /// Create a stopped supervisor.
    pub fn new(
        connector: C,
        endpoint: Endpoint,
        config: SupervisorConfig,
        notifier: Notifier,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::default());

        Self {
            inner: Arc::new(Inner {
                client: SessionClient::new(connector, config.connect_timeout),
                config,
                endpoint: Mutex::new(endpoint),
                subscriptions: Mutex::new(Vec::new()),
                monitoring: MonitoringState::default(),
                status_tx,
                notifier,
                control: AsyncMutex::new(Control::default()),
            }),
        }
    }

    /// Register a handler that is armed on every session this supervisor
    /// opens, including sessions opened by reconnection.
    pub fn subscribe(&self, kind: impl Into<String>, handler: EventHandler) {
        let kind = kind.into();

        if self.inner.client.is_alive() {
            if let Err(e) = self.inner.client.subscribe(&kind, Arc::clone(&handler)) {
                debug!(error = %e, "Session closed before subscribe, arming on next connect");
            }
        }

        lock(&self.inner.subscriptions).push((kind, handler));
    }

    /// Start monitoring and wait for the initial connect.
    ///
    /// If monitoring is already running it is stopped first, so at most one
    /// session is ever open.
    ///
    /// # Errors
    ///
    /// Returns the connection error if the initial connect fails (monitoring
    /// moves to `Failed` and is not retried), or `MonitoringStopped` if
    /// [`stop`](Self::stop) is called before the connect completes.
    #[instrument(skip(self))]
    pub async fn start(&self) -> CoreResult<()> {
        let ready_rx = {
            let mut control = self.inner.control.lock().await;
            if control.task.is_some() {
                info!("Monitoring already started, replacing it");
            }
            self.inner.halt(&mut control).await;
            Inner::launch(&self.inner, &mut control)
        };

        await_ready(ready_rx).await
    }

    /// Stop monitoring and release the session. Safe to call at any time.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut control = self.inner.control.lock().await;
        self.inner.halt(&mut control).await;
        self.inner
            .set_state(ConnectionState::Stopped, "Monitoring stopped");
    }

    /// Replace the endpoint. If monitoring is active, the current session
    /// is closed once and one connect is made with the new endpoint.
    ///
    /// # Errors
    ///
    /// Returns the connect error from the restart, if one happened.
    #[instrument(skip(self))]
    pub async fn update_settings(&self, endpoint: Endpoint) -> CoreResult<()> {
        let ready_rx = {
            let mut control = self.inner.control.lock().await;
            let restart = self.inner.monitoring.is_active();
            *lock(&self.inner.endpoint) = endpoint;

            if !restart {
                debug!("Settings stored, monitoring inactive");
                return Ok(());
            }

            info!("Settings changed while monitoring, reconnecting");
            self.inner.halt(&mut control).await;
            self.inner
                .set_state(ConnectionState::Stopped, "Restarting with new settings");
            Inner::launch(&self.inner, &mut control)
        };

        await_ready(ready_rx).await
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.status_tx.borrow().state
    }

    /// Current connection status with display text.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Subscribe to connection status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Whether monitoring is active.
    pub fn is_active(&self) -> bool {
        self.inner.monitoring.is_active()
    }

    /// Reconnect attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.monitoring.reconnect_attempts()
    }

    /// Endpoint used for the next connect.
    pub fn endpoint(&self) -> Endpoint {
        self.inner.endpoint()
    }

    /// Identifier of the open session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.client.session_id()
    }
}

impl<C: Connector> Inner<C> {
    /// Spawn a supervision run. The caller holds `control` and has halted
    /// any previous run.
    fn launch(
        inner: &Arc<Self>,
        control: &mut Control,
    ) -> oneshot::Receiver<CoreResult<()>> {
        let endpoint = inner.endpoint();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();

        inner.monitoring.activate();
        inner.set_state(
            ConnectionState::Connecting,
            format!("Connecting to {endpoint}"),
        );

        control.task = Some(tokio::spawn(run(
            Arc::clone(inner),
            endpoint,
            stop_rx,
            ready_tx,
        )));
        control.stop_tx = Some(stop_tx);

        ready_rx
    }

    fn endpoint(&self) -> Endpoint {
        lock(&self.endpoint).clone()
    }

    fn set_state(&self, state: ConnectionState, detail: impl Into<String>) {
        let status = ConnectionStatus::new(state, detail);
        info!(state = ?status.state, detail = %status.detail, "Connection status changed");
        self.status_tx.send_replace(status.clone());
        self.notifier.notify(Notification::Connection(status));
    }

    /// Signal the running task, wait up to one poll interval for it to
    /// exit, then release the session.
    async fn halt(&self, control: &mut Control) {
        if let Some(stop_tx) = control.stop_tx.take() {
            let _ = stop_tx.send(true);
        }

        if let Some(mut task) = control.task.take() {
            match tokio::time::timeout(self.config.poll_interval, &mut task).await {
                Ok(Ok(())) => debug!("Supervision task stopped cleanly"),
                Ok(Err(e)) => error!(error = ?e, "Supervision task panicked"),
                Err(_) => {
                    warn!("Supervision task did not stop within one poll interval, aborting");
                    task.abort();
                }
            }
        }

        self.client.disconnect();
        self.monitoring.deactivate();
    }

    /// Terminal failure: stop monitoring without waiting for an operator.
    fn fail(&self, detail: String) {
        self.monitoring.deactivate();
        self.client.disconnect();
        self.set_state(ConnectionState::Failed, detail);
    }

    /// Connect, re-arm every subscription and reset the attempt counter.
    async fn connect_and_arm(&self, endpoint: &Endpoint) -> CoreResult<SessionId> {
        let session_id = self.client.connect(endpoint).await?;

        let subscriptions = lock(&self.subscriptions).clone();
        for (kind, handler) in subscriptions {
            self.client.subscribe(&kind, handler)?;
        }

        self.monitoring.reset_attempts();

        Ok(session_id)
    }

    async fn supervise(&self, mut stop_rx: watch::Receiver<bool>) {
        let poll_interval = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    debug!("Supervision stop requested");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if !self.monitoring.is_active() {
                return;
            }

            if self.client.is_alive() {
                continue;
            }

            warn!("Session lost");

            match self.reconnect(&mut stop_rx).await {
                Reconnect::Restored => ticker.reset(),
                Reconnect::Cancelled => return,
                Reconnect::Exhausted(e) => {
                    error!(
                        attempts = self.config.max_reconnect_attempts,
                        error = %e,
                        "Reconnect attempts exhausted"
                    );
                    self.fail(format!(
                        "Connection lost; gave up after {} attempts: {e}",
                        self.config.max_reconnect_attempts
                    ));
                    return;
                }
            }
        }
    }

    async fn reconnect(&self, stop_rx: &mut watch::Receiver<bool>) -> Reconnect {
        self.client.disconnect();
        let endpoint = self.endpoint();
        let max_attempts = self.config.max_reconnect_attempts;

        loop {
            let attempt = self.monitoring.next_attempt();
            self.set_state(
                ConnectionState::Reconnecting { attempt },
                format!("Reconnecting to {endpoint} (attempt {attempt}/{max_attempts})"),
            );

            let result = tokio::select! {
                _ = stop_rx.changed() => return Reconnect::Cancelled,
                result = self.connect_and_arm(&endpoint) => result,
            };

            match result {
                Ok(session_id) => {
                    info!(session_id = %session_id, attempt, "Reconnected");
                    self.set_state(
                        ConnectionState::Connected,
                        format!("Reconnected to {endpoint}"),
                    );
                    return Reconnect::Restored;
                }
                Err(e) if attempt >= max_attempts => return Reconnect::Exhausted(e),
                Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
            }

            tokio::select! {
                _ = stop_rx.changed() => return Reconnect::Cancelled,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
    }
}

async fn run<C: Connector>(
    inner: Arc<Inner<C>>,
    endpoint: Endpoint,
    mut stop_rx: watch::Receiver<bool>,
    ready_tx: oneshot::Sender<CoreResult<()>>,
) {
    let connected = tokio::select! {
        _ = stop_rx.changed() => {
            let _ = ready_tx.send(Err(CoreError::MonitoringStopped {
                location: ErrorLocation::from(Location::caller()),
            }));
            return;
        }
        result = inner.connect_and_arm(&endpoint) => result,
    };

    match connected {
        Ok(session_id) => {
            info!(session_id = %session_id, endpoint = %endpoint, "Monitoring started");
            inner.set_state(
                ConnectionState::Connected,
                format!("Connected to {endpoint}"),
            );
            let _ = ready_tx.send(Ok(()));
        }
        Err(e) => {
            error!(endpoint = %endpoint, error = %e, "Initial connect failed, not retrying");
            inner.fail(format!("Could not connect to {endpoint}: {e}"));
            let _ = ready_tx.send(Err(e));
            return;
        }
    }

    inner.supervise(stop_rx).await;
}

async fn await_ready(ready_rx: oneshot::Receiver<CoreResult<()>>) -> CoreResult<()> {
    ready_rx.await.unwrap_or_else(|_| {
        Err(CoreError::MonitoringStopped {
            location: ErrorLocation::from(Location::caller()),
        })
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
