//! obs-websocket (protocol v5) transport.

mod auth;
mod connector;
mod protocol;

pub(crate) use {
    auth::authentication_string,
    protocol::{ServerMessage, decode, identify_message},
};

pub use connector::ObsConnector;
