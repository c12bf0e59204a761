use std::sync::Arc;

use serde_json::Value;

/// A typed notification received from the remote event source.
///
/// Only `kind` is interpreted by the session layer; `data` is handed to
/// subscribers untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Event type name, used as the subscription key.
    pub kind: String,
    /// Event payload.
    pub data: Value,
}

impl InboundEvent {
    /// Create an event of `kind` carrying `data`.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// Callback invoked on the delivery task for every event of a subscribed kind.
pub type EventHandler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;
