//! Dials OBS over obs-websocket and turns the socket into a [`Link`].

use crate::{
    Connector, CoreError, CoreResult, Endpoint, InboundEvent, Link,
    obs::{ServerMessage, authentication_string, decode, identify_message, protocol},
};

use std::{
    io,
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Error as WsError, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL},
    },
};
use tracing::{debug, info, instrument, trace, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the per-session event channel.
const DEFAULT_EVENT_BUFFER: usize = 64;

/// [`Connector`] for OBS Studio's obs-websocket server (protocol v5).
#[derive(Debug, Clone)]
pub struct ObsConnector {
    event_buffer: usize,
}

impl Default for ObsConnector {
    fn default() -> Self {
        Self {
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ObsConnector {
    /// Create a connector with the default event buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for ObsConnector {
    #[instrument(skip(self))]
    async fn connect(&self, endpoint: &Endpoint) -> CoreResult<Link> {
        let url = format!("ws://{}:{}", endpoint.host, endpoint.port);

        let mut request =
            url.as_str()
                .into_client_request()
                .map_err(|e| CoreError::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: format!("Invalid address {url}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(protocol::SUBPROTOCOL),
        );

        let (mut socket, _response) = connect_async(request)
            .await
            .map_err(|e| classify(endpoint, e))?;

        debug!(endpoint = %endpoint, "WebSocket open, awaiting Hello");

        identify(&mut socket, endpoint).await?;

        info!(endpoint = %endpoint, "Identified with obs-websocket");

        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        let alive = Arc::new(AtomicBool::new(true));
        let (close_tx, close_rx) = oneshot::channel();

        tokio::spawn(pump(
            socket,
            events_tx,
            Arc::clone(&alive),
            close_rx,
            endpoint.to_string(),
        ));

        Ok(Link::new(events_rx, alive, close_tx))
    }
}

/// Run the Hello / Identify / Identified exchange.
async fn identify(socket: &mut Socket, endpoint: &Endpoint) -> CoreResult<()> {
    let hello = match decode(&next_text(socket, endpoint).await?)? {
        ServerMessage::Hello(hello) => hello,
        other => {
            return Err(CoreError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: format!("Expected Hello, received {other:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    debug!(
        obs_web_socket_version = ?hello.obs_web_socket_version,
        rpc_version = hello.rpc_version,
        auth_required = hello.authentication.is_some(),
        "Hello received"
    );

    let authentication = match (&hello.authentication, &endpoint.password) {
        (Some(challenge), Some(password)) => Some(authentication_string(
            password,
            &challenge.salt,
            &challenge.challenge,
        )),
        (Some(_), None) => {
            return Err(CoreError::AuthFailed {
                endpoint: endpoint.to_string(),
                reason: "Server requires a password and none is configured".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        (None, _) => None,
    };

    socket
        .send(Message::Text(identify_message(authentication.as_deref())?))
        .await
        .map_err(|e| classify(endpoint, e))?;

    loop {
        match decode(&next_text(socket, endpoint).await?)? {
            ServerMessage::Identified => return Ok(()),
            other => trace!(message = ?other, "Ignoring frame before Identified"),
        }
    }
}

/// Read frames until a text frame arrives, mapping closes to errors.
async fn next_text(socket: &mut Socket, endpoint: &Endpoint) -> CoreResult<String> {
    while let Some(frame) = socket.next().await {
        match frame.map_err(|e| classify(endpoint, e))? {
            Message::Text(text) => return Ok(text),
            Message::Close(close) => {
                let (code, reason) = close
                    .map(|c| (u16::from(c.code), c.reason.into_owned()))
                    .unwrap_or((0, String::new()));

                if code == protocol::CLOSE_AUTHENTICATION_FAILED {
                    return Err(CoreError::AuthFailed {
                        endpoint: endpoint.to_string(),
                        reason: format!("Server closed with {code}: {reason}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }

                return Err(CoreError::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: format!("Server closed during handshake with {code}: {reason}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            _ => continue,
        }
    }

    Err(CoreError::ConnectionFailed {
        endpoint: endpoint.to_string(),
        reason: "Connection closed during handshake".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Forward Event frames until the socket dies or the link is closed.
async fn pump(
    mut socket: Socket,
    events: mpsc::Sender<InboundEvent>,
    alive: Arc<AtomicBool>,
    mut close_rx: oneshot::Receiver<()>,
    endpoint: String,
) {
    loop {
        tokio::select! {
            _ = &mut close_rx => {
                if let Err(e) = socket.close(None).await {
                    debug!(endpoint = %endpoint, error = %e, "Close handshake failed");
                }
                break;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => match decode(&text) {
                    Ok(ServerMessage::Event(event)) => {
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(other) => trace!(message = ?other, "Ignoring non-event frame"),
                    Err(e) => warn!(error = %e, "Ignoring malformed frame"),
                },
                Some(Ok(Message::Close(close))) => {
                    info!(endpoint = %endpoint, frame = ?close, "Server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(endpoint = %endpoint, error = %e, "Connection lost");
                    break;
                }
                None => break,
            }
        }
    }

    alive.store(false, Ordering::Release);
    debug!(endpoint = %endpoint, "Socket pump stopped");
}

#[track_caller]
fn classify(endpoint: &Endpoint, error: WsError) -> CoreError {
    let location = ErrorLocation::from(Location::caller());
    let endpoint = endpoint.to_string();
    let reason = error.to_string();

    match error {
        WsError::Io(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            CoreError::ConnectionRefused {
                endpoint,
                reason,
                location,
            }
        }
        WsError::Io(e) if e.kind() == io::ErrorKind::TimedOut => CoreError::ConnectionTimeout {
            endpoint,
            reason,
            location,
        },
        _ => CoreError::ConnectionFailed {
            endpoint,
            reason,
            location,
        },
    }
}
