//! Test doubles for the binary crate.

use obs_renamer_core::{Connector, CoreError, CoreResult, Endpoint, InboundEvent, Link};

use std::{
    io,
    panic::Location,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, oneshot};

/// Writer whose bytes stay readable after the console is moved into the app.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Connector that refuses every connect and counts attempts.
#[derive(Clone, Default)]
pub(crate) struct RefusingConnector {
    attempts: Arc<AtomicUsize>,
}

impl RefusingConnector {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }
}

impl Connector for RefusingConnector {
    async fn connect(&self, endpoint: &Endpoint) -> CoreResult<Link> {
        self.attempts.fetch_add(1, Ordering::AcqRel);
        Err(CoreError::ConnectionRefused {
            endpoint: endpoint.to_string(),
            reason: "connection refused".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Connector that accepts every connect and keeps the remote ends open.
#[derive(Clone, Default)]
pub(crate) struct AcceptingConnector {
    remotes: Arc<Mutex<Vec<(mpsc::Sender<InboundEvent>, oneshot::Receiver<()>)>>>,
}

impl AcceptingConnector {
    pub(crate) fn connections(&self) -> usize {
        self.remotes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Connector for AcceptingConnector {
    async fn connect(&self, _endpoint: &Endpoint) -> CoreResult<Link> {
        let (events_tx, events_rx) = mpsc::channel(8);
        let (close_tx, close_rx) = oneshot::channel();
        self.remotes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((events_tx, close_rx));
        Ok(Link::new(events_rx, Arc::new(AtomicBool::new(true)), close_tx))
    }
}
