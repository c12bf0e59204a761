use std::fmt;

/// Address and credential of the remote event source.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Shared secret, if the remote end requires one.
    pub password: Option<String>,
}

impl Endpoint {
    /// Create an endpoint. An empty password is treated as no password.
    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.filter(|p| !p.is_empty()),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// Keeps the credential out of logs and error messages.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
