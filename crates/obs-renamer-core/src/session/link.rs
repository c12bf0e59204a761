use crate::{CoreResult, Endpoint, InboundEvent};

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::{mpsc, oneshot};

/// Transport handle backing one session.
///
/// The transport pushes decoded events into `events`, clears `alive` when
/// the underlying connection is lost, and tears the connection down when
/// the close signal fires or is dropped.
pub struct Link {
    pub(crate) events: mpsc::Receiver<InboundEvent>,
    pub(crate) alive: Arc<AtomicBool>,
    pub(crate) close_tx: oneshot::Sender<()>,
}

impl Link {
    /// Bundle the transport's event channel, liveness flag and close signal.
    pub fn new(
        events: mpsc::Receiver<InboundEvent>,
        alive: Arc<AtomicBool>,
        close_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            events,
            alive,
            close_tx,
        }
    }

    /// Whether the transport still reports the connection as up.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Opens transport links to an [`Endpoint`].
///
/// This is the seam between the session layer and the wire protocol.
pub trait Connector: Send + Sync + 'static {
    /// Dial `endpoint` and complete any handshake.
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = CoreResult<Link>> + Send;
}
