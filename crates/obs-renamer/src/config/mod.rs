mod connection_config;
#[allow(clippy::module_inception)]
mod config;
mod supervision_config;

pub(crate) use {
    config::Config, connection_config::ConnectionConfig, supervision_config::SupervisionConfig,
};

use obs_renamer_core::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_RECONNECT_DELAY,
    MAX_RECONNECT_ATTEMPTS,
};

pub(crate) const DEFAULT_HOST: &str = "localhost";
pub(crate) const DEFAULT_PORT: u16 = 4455;

pub(crate) fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

pub(crate) fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

pub(crate) fn default_max_reconnect_attempts() -> u32 {
    MAX_RECONNECT_ATTEMPTS
}

pub(crate) fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}
