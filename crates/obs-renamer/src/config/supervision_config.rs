use crate::config::{
    default_connect_timeout_ms, default_max_reconnect_attempts, default_poll_interval_ms,
    default_reconnect_delay_ms,
};

use serde::{Deserialize, Serialize};

/// Liveness polling and reconnect tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionConfig {
    /// How often the session is checked, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause between reconnect attempts, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Reconnect attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Limit on a single connect, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}
