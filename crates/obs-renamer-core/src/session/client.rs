//! Session client: owns at most one open connection to the event source.
//!
//! Each session gets its own delivery task and handler map. Tearing a
//! session down flips its `closed` flag and aborts the delivery task, so
//! handlers registered against it can never fire for a later session.

use crate::{Connector, CoreError, CoreResult, Endpoint, EventHandler, InboundEvent, Link};

use std::{
    collections::HashMap,
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

/// Identifier of one logical connection, used for log correlation.
pub type SessionId = Uuid;

type HandlerMap = HashMap<String, Vec<EventHandler>>;

struct ActiveSession {
    id: SessionId,
    alive: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    handlers: Arc<RwLock<HandlerMap>>,
    close_tx: Option<oneshot::Sender<()>>,
    delivery: JoinHandle<()>,
}

impl ActiveSession {
    fn open(link: Link) -> Self {
        let id = Uuid::new_v4();
        let closed = Arc::new(AtomicBool::new(false));
        let handlers: Arc<RwLock<HandlerMap>> = Arc::default();

        let delivery = tokio::spawn(deliver(
            id,
            link.events,
            Arc::clone(&handlers),
            Arc::clone(&closed),
        ));

        Self {
            id,
            alive: link.alive,
            closed,
            handlers,
            close_tx: Some(link.close_tx),
            delivery,
        }
    }

    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.alive.load(Ordering::Acquire)
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.delivery.abort();
        if let Some(close_tx) = self.close_tx.take() {
            // Transport may already be gone.
            let _ = close_tx.send(());
        }
        debug!(session_id = %self.id, "Session closed");
    }
}

/// Drain one session's events in transport order.
async fn deliver(
    session_id: SessionId,
    mut events: mpsc::Receiver<InboundEvent>,
    handlers: Arc<RwLock<HandlerMap>>,
    closed: Arc<AtomicBool>,
) {
    while let Some(event) = events.recv().await {
        let subscribers = {
            let map = handlers.read().unwrap_or_else(PoisonError::into_inner);
            map.get(&event.kind).cloned().unwrap_or_default()
        };

        if subscribers.is_empty() {
            trace!(session_id = %session_id, kind = %event.kind, "No subscriber for event");
            continue;
        }

        for handler in &subscribers {
            if closed.load(Ordering::Acquire) {
                return;
            }
            handler(&event);
        }
    }

    debug!(session_id = %session_id, "Event stream ended");
}

/// Owns one logical connection to the remote event source.
pub struct SessionClient<C> {
    connector: C,
    connect_timeout: Duration,
    slot: Mutex<Option<ActiveSession>>,
}

impl<C: Connector> SessionClient<C> {
    /// Create a client that dials through `connector`.
    pub fn new(connector: C, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
            slot: Mutex::new(None),
        }
    }

    /// Open a new session, tearing down any previous one first.
    ///
    /// # Errors
    ///
    /// Returns a connection error (`ConnectionRefused`, `AuthFailed`,
    /// `ConnectionTimeout`, `ConnectionFailed`) if the transport cannot be
    /// established within the connect timeout.
    #[instrument(skip(self))]
    pub async fn connect(&self, endpoint: &Endpoint) -> CoreResult<SessionId> {
        self.disconnect();

        let link = match tokio::time::timeout(
            self.connect_timeout,
            self.connector.connect(endpoint),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(CoreError::ConnectionTimeout {
                    endpoint: endpoint.to_string(),
                    reason: format!(
                        "no handshake within {}ms",
                        self.connect_timeout.as_millis()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let session = ActiveSession::open(link);
        let session_id = session.id;

        // A concurrent connect may have installed a session while we were
        // dialling; only one may stay open.
        let previous = self.lock_slot().replace(session);
        if let Some(previous) = previous {
            warn!(
                session_id = %previous.id,
                "Replacing session opened by a concurrent connect"
            );
            drop(previous);
        }

        info!(session_id = %session_id, endpoint = %endpoint, "Session opened");

        Ok(session_id)
    }

    /// Register `handler` for events of `kind` on the current session.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if no session is open.
    #[track_caller]
    pub fn subscribe(&self, kind: &str, handler: EventHandler) -> CoreResult<()> {
        let slot = self.lock_slot();
        let session = slot.as_ref().ok_or_else(|| CoreError::NotConnected {
            location: ErrorLocation::from(Location::caller()),
        })?;

        session
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind.to_string())
            .or_default()
            .push(handler);

        debug!(session_id = %session.id, kind, "Subscribed");

        Ok(())
    }

    /// Whether a session is open and its transport is up.
    pub fn is_alive(&self) -> bool {
        self.lock_slot().as_ref().is_some_and(ActiveSession::is_alive)
    }

    /// Identifier of the open session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.lock_slot().as_ref().map(|session| session.id)
    }

    /// Close the current session, if any. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let previous = self.lock_slot().take();
        if let Some(session) = previous {
            info!(session_id = %session.id, "Disconnecting session");
            drop(session);
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
