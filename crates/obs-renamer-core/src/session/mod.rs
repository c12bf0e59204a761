mod client;
mod endpoint;
mod event;
mod link;

pub use {
    client::{SessionClient, SessionId},
    endpoint::Endpoint,
    event::{EventHandler, InboundEvent},
    link::{Connector, Link},
};
