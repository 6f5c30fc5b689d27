//! WebSocket endpoint for the chat protocol.
//!
//! `GET /ws` upgrades to a WebSocket and hands the socket, wrapped as a
//! [`Channel`], to the shared [`ConnectionManager`]. The manager owns the
//! whole session from there: handshake, dispatch, registry membership, and
//! teardown.
//!
//! [`ConnectionManager`]: lawhelp_core::connection::lifecycle::ConnectionManager

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use lawhelp_core::connection::channel::{Channel, InboundFrame};
use lawhelp_types::envelope::ServerEnvelope;
use lawhelp_types::error::ChannelError;

use crate::state::AppState;

/// Upgrade an HTTP request to a chat protocol connection.
///
/// Mounted at `/ws` in the router. Authentication happens in-band with the
/// first `auth` envelope, so the upgrade itself is unauthenticated.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let reason = state.connections.run(WebSocketChannel::new(socket)).await;
        tracing::debug!(?reason, "WebSocket task finished");
    })
}

/// [`Channel`] over an axum WebSocket.
pub struct WebSocketChannel {
    socket: WebSocket,
    closed: bool,
}

impl WebSocketChannel {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            closed: false,
        }
    }
}

/// What one transport message means to the protocol.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Frame(InboundFrame),
    Closed,
    Skip,
}

fn classify(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Frame(InboundFrame::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Inbound::Frame(InboundFrame::Binary(bytes.to_vec())),
        Message::Close(_) => Inbound::Closed,
        // axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => Inbound::Skip,
    }
}

impl Channel for WebSocketChannel {
    async fn recv(&mut self) -> Option<Result<InboundFrame, ChannelError>> {
        if self.closed {
            return None;
        }
        loop {
            match self.socket.recv().await? {
                Ok(message) => match classify(message) {
                    Inbound::Frame(frame) => return Some(Ok(frame)),
                    Inbound::Closed => {
                        self.closed = true;
                        return None;
                    }
                    Inbound::Skip => continue,
                },
                Err(e) => return Some(Err(ChannelError::Io(e.to_string()))),
            }
        }
    }

    async fn send(&mut self, envelope: &ServerEnvelope) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        let json = envelope
            .encode()
            .map_err(|e| ChannelError::Encode(e.to_string()))?;
        self.socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.socket.send(Message::Close(None)).await {
            tracing::trace!(error = %e, "Close frame not delivered");
        }
    }
}
