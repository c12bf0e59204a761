use crate::config::{default_host, default_port};

use serde::{Deserialize, Serialize};

/// Where to find obs-websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hostname or IP address of the machine running OBS.
    #[serde(default = "default_host")]
    pub host: String,
    /// obs-websocket server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// obs-websocket server password, if authentication is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
        }
    }
}
