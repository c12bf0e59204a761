use std::time::Duration;

/// How often the supervisor checks session liveness.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Pause between failed reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Reconnect attempts before monitoring gives up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Upper bound on one connect, handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Liveness supervisor timing and retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Interval between liveness checks.
    pub poll_interval: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Attempts made after a loss before reporting a terminal failure.
    pub max_reconnect_attempts: u32,
    /// Time limit for each connect.
    pub connect_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}
