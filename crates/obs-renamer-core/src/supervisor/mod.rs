mod config;
mod state;
#[allow(clippy::module_inception)]
mod supervisor;

pub use {
    config::{
        DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_RECONNECT_DELAY,
        MAX_RECONNECT_ATTEMPTS, SupervisorConfig,
    },
    state::{ConnectionState, ConnectionStatus, MonitoringState},
    supervisor::Supervisor,
};
