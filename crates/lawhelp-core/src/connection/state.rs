//! Per-connection state machine.
//!
//! ```text
//!   OPEN_UNAUTH ──auth ok──▶ AUTHENTICATED ──close──▶ CLOSED
//!        │                                              ▲
//!        └──── bad/missing token, non-auth, timeout ────┘
//! ```
//!
//! Transition functions are pure with respect to I/O: they return the
//! envelope to emit and leave sending, closing, and registry bookkeeping to
//! the lifecycle task.

use std::fmt;

use lawhelp_types::envelope::{ClientEnvelope, ServerEnvelope};
use lawhelp_types::error::EnvelopeError;
use lawhelp_types::identity::SubjectId;
use tracing::{info, warn};

use crate::auth::verifier::IdentityVerifier;
use crate::connection::channel::InboundFrame;
use crate::connection::registry::ConnectionId;

/// State bound to an authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedContext {
    pub subject_id: SubjectId,
    /// Last session this connection successfully posted to.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    OpenUnauth,
    Authenticated(AuthenticatedContext),
    Closed,
}

/// Why a handshake was refused. The display text is the `auth_error` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeRejection {
    MissingToken,
    InvalidToken,
    Unauthorized,
    Timeout,
}

impl fmt::Display for HandshakeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeRejection::MissingToken => write!(f, "Missing token"),
            HandshakeRejection::InvalidToken => write!(f, "Invalid token"),
            HandshakeRejection::Unauthorized => write!(f, "Unauthorized"),
            HandshakeRejection::Timeout => write!(f, "Authentication timeout"),
        }
    }
}

/// Result of feeding one event to an unauthenticated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Stay in OPEN_UNAUTH and emit this envelope.
    Reply(ServerEnvelope),
    /// Now AUTHENTICATED; emit `auth_success` and register the connection.
    Promote {
        subject_id: SubjectId,
        reply: ServerEnvelope,
    },
    /// Now CLOSED; emit `auth_error` and close the channel.
    Reject(ServerEnvelope),
    /// Already CLOSED; nothing to emit.
    Ignore,
}

/// One physical channel's protocol state.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            state: ConnectionState::OpenUnauth,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, ConnectionState::Authenticated(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    /// Mutable access to the authenticated context, if any.
    pub fn authenticated_mut(&mut self) -> Option<&mut AuthenticatedContext> {
        match &mut self.state {
            ConnectionState::Authenticated(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Handle one frame while OPEN_UNAUTH.
    ///
    /// Only `auth` can move the connection forward. Any other decodable
    /// envelope is a skipped handshake and closes the connection; an
    /// undecodable frame is reported and the connection keeps waiting.
    /// Outside OPEN_UNAUTH the state is left untouched.
    pub fn on_handshake_frame<V: IdentityVerifier + ?Sized>(
        &mut self,
        frame: &InboundFrame,
        verifier: &V,
    ) -> Transition {
        match self.state {
            ConnectionState::OpenUnauth => {}
            ConnectionState::Authenticated(_) => {
                return Transition::Reply(ServerEnvelope::error("Already authenticated"));
            }
            ConnectionState::Closed => return Transition::Ignore,
        }

        let envelope = match frame.decode() {
            Ok(envelope) => envelope,
            Err(err @ EnvelopeError::Malformed) => {
                warn!(connection_id = %self.id, "Malformed frame before authentication");
                return Transition::Reply(ServerEnvelope::error(err.to_string()));
            }
            Err(EnvelopeError::UnsupportedType(kind)) => {
                warn!(connection_id = %self.id, %kind, "Unknown envelope before authentication");
                return self.reject(HandshakeRejection::Unauthorized);
            }
        };

        let token = match envelope {
            ClientEnvelope::Auth { token } => token,
            other => {
                warn!(
                    connection_id = %self.id,
                    kind = %other.kind(),
                    "Envelope received before authentication"
                );
                return self.reject(HandshakeRejection::Unauthorized);
            }
        };

        let token = match token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => return self.reject(HandshakeRejection::MissingToken),
        };

        match verifier.verify(&token) {
            Ok(subject_id) => {
                info!(connection_id = %self.id, %subject_id, "Connection authenticated");
                self.state = ConnectionState::Authenticated(AuthenticatedContext {
                    subject_id: subject_id.clone(),
                    session_id: None,
                });
                Transition::Promote {
                    reply: ServerEnvelope::AuthSuccess {
                        user_id: Some(subject_id.to_string()),
                    },
                    subject_id,
                }
            }
            Err(err) => {
                warn!(connection_id = %self.id, error = %err, "Token verification failed");
                self.reject(HandshakeRejection::InvalidToken)
            }
        }
    }

    /// The handshake deadline passed without a successful `auth`.
    pub fn on_handshake_timeout(&mut self) -> Transition {
        match self.state {
            ConnectionState::OpenUnauth => {
                warn!(connection_id = %self.id, "Authentication timed out");
                self.reject(HandshakeRejection::Timeout)
            }
            ConnectionState::Authenticated(_) => {
                Transition::Reply(ServerEnvelope::error("Already authenticated"))
            }
            ConnectionState::Closed => Transition::Ignore,
        }
    }

    /// Move to CLOSED.
    ///
    /// Returns the bound subject on the first call from AUTHENTICATED so the
    /// caller can deregister exactly once; every later call returns `None`.
    pub fn close(&mut self) -> Option<SubjectId> {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Authenticated(ctx) => Some(ctx.subject_id),
            ConnectionState::OpenUnauth | ConnectionState::Closed => None,
        }
    }

    fn reject(&mut self, reason: HandshakeRejection) -> Transition {
        self.state = ConnectionState::Closed;
        Transition::Reject(ServerEnvelope::auth_error(reason.to_string()))
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
