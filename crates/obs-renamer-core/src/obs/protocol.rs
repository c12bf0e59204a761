//! obs-websocket v5 frames used by the connector.
//!
//! Only the handshake (Hello / Identify / Identified) and Event frames are
//! modelled; every other op code decodes to [`ServerMessage::Other`].

use crate::{CoreError, CoreResult, InboundEvent};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const RPC_VERSION: u32 = 1;
pub(crate) const SUBPROTOCOL: &str = "obswebsocket.json";
/// Close code sent by the server when the Identify credential is wrong.
pub(crate) const CLOSE_AUTHENTICATION_FAILED: u16 = 4009;
/// `EventSubscription::Outputs`, which carries `RecordStateChanged`.
pub(crate) const EVENT_SUBSCRIPTION_OUTPUTS: u32 = 1 << 6;

const OP_HELLO: u8 = 0;
const OP_IDENTIFY: u8 = 1;
const OP_IDENTIFIED: u8 = 2;
const OP_EVENT: u8 = 5;

#[derive(Debug, Deserialize, Serialize)]
struct Envelope<T> {
    op: u8,
    d: T,
}

/// Server greeting, optionally carrying an authentication challenge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Hello {
    #[serde(default)]
    pub(crate) obs_web_socket_version: Option<String>,
    pub(crate) rpc_version: u32,
    #[serde(default)]
    pub(crate) authentication: Option<AuthChallenge>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct AuthChallenge {
    pub(crate) challenge: String,
    pub(crate) salt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identify<'a> {
    rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication: Option<&'a str>,
    event_subscriptions: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventFrame {
    event_type: String,
    #[serde(default)]
    event_data: Value,
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServerMessage {
    Hello(Hello),
    Identified,
    Event(InboundEvent),
    Other(u8),
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns `MalformedEvent` if the frame is not valid JSON or a known op
/// code carries an unexpected payload.
#[track_caller]
pub(crate) fn decode(text: &str) -> CoreResult<ServerMessage> {
    let envelope: Envelope<Value> = serde_json::from_str(text).map_err(|e| malformed(e))?;

    match envelope.op {
        OP_HELLO => serde_json::from_value(envelope.d)
            .map(ServerMessage::Hello)
            .map_err(|e| malformed(e)),
        OP_IDENTIFIED => Ok(ServerMessage::Identified),
        OP_EVENT => {
            let frame: EventFrame = serde_json::from_value(envelope.d).map_err(|e| malformed(e))?;
            Ok(ServerMessage::Event(InboundEvent::new(
                frame.event_type,
                frame.event_data,
            )))
        }
        other => Ok(ServerMessage::Other(other)),
    }
}

/// Encode the Identify frame, subscribing to output events only.
#[track_caller]
pub(crate) fn identify_message(authentication: Option<&str>) -> CoreResult<String> {
    let envelope = Envelope {
        op: OP_IDENTIFY,
        d: Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: EVENT_SUBSCRIPTION_OUTPUTS,
        },
    };

    serde_json::to_string(&envelope).map_err(|e| malformed(e))
}

#[track_caller]
fn malformed(error: serde_json::Error) -> CoreError {
    CoreError::MalformedEvent {
        reason: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
