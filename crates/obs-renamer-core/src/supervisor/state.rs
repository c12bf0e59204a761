use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not monitoring.
    #[default]
    Stopped,
    /// First connect in progress.
    Connecting,
    /// Session open and healthy.
    Connected,
    /// Session lost; retrying.
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Monitoring gave up. Requires an explicit restart.
    Failed,
}

/// Connection state plus text for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Human-readable detail.
    pub detail: String,
}

impl ConnectionStatus {
    /// Pair `state` with `detail`.
    pub fn new(state: ConnectionState, detail: impl Into<String>) -> Self {
        Self {
            state,
            detail: detail.into(),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new(ConnectionState::Stopped, "Not started")
    }
}

/// Whether supervision is active, and how many reconnects have been tried
/// since the last successful connect.
#[derive(Debug, Default)]
pub struct MonitoringState {
    active: AtomicBool,
    attempts: AtomicU32,
}

impl MonitoringState {
    /// Whether monitoring is running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Reconnect attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    pub(crate) fn activate(&self) {
        self.attempts.store(0, Ordering::Release);
        self.active.store(true, Ordering::Release);
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Count one more attempt and return its 1-based number.
    pub(crate) fn next_attempt(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn reset_attempts(&self) {
        self.attempts.store(0, Ordering::Release);
    }
}
