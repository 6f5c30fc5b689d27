//! WebSocket protocol envelopes.
//!
//! Every frame on the chat channel is one JSON object tagged by `type`.
//! Inbound frames are decoded exactly once, at the channel boundary, into a
//! [`ClientEnvelope`]; outbound frames are built from [`ServerEnvelope`].
//!
//! ```json
//! {"type":"auth","token":"eyJ..."}
//! {"type":"user_message","sessionId":"0190...","content":"Is theft at night punished more?"}
//! {"type":"ai_response","sessionId":"0190...","content":"Yes. Article 318 (2) ..."}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EnvelopeError;

/// The fixed `type` vocabulary of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Auth,
    AuthSuccess,
    AuthError,
    UserMessage,
    MessageSent,
    AiResponse,
    Error,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Auth => "auth",
            EnvelopeKind::AuthSuccess => "auth_success",
            EnvelopeKind::AuthError => "auth_error",
            EnvelopeKind::UserMessage => "user_message",
            EnvelopeKind::MessageSent => "message_sent",
            EnvelopeKind::AiResponse => "ai_response",
            EnvelopeKind::Error => "error",
        }
    }

    /// Whether clients are allowed to send this kind.
    pub fn is_client_bound(&self) -> bool {
        matches!(self, EnvelopeKind::Auth | EnvelopeKind::UserMessage)
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(EnvelopeKind::Auth),
            "auth_success" => Ok(EnvelopeKind::AuthSuccess),
            "auth_error" => Ok(EnvelopeKind::AuthError),
            "user_message" => Ok(EnvelopeKind::UserMessage),
            "message_sent" => Ok(EnvelopeKind::MessageSent),
            "ai_response" => Ok(EnvelopeKind::AiResponse),
            "error" => Ok(EnvelopeKind::Error),
            other => Err(format!("unknown envelope type: '{other}'")),
        }
    }
}

/// Envelope sent by a client.
///
/// Required fields are optional here on purpose: presence is a semantic
/// check made by the handshake and the dispatcher, which report it with
/// protocol-specific messages rather than a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    Auth {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    UserMessage {
        #[serde(default, rename = "sessionId", skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

impl ClientEnvelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            ClientEnvelope::Auth { .. } => EnvelopeKind::Auth,
            ClientEnvelope::UserMessage { .. } => EnvelopeKind::UserMessage,
        }
    }

    /// Decode one text frame.
    ///
    /// - not JSON, not an object, no string `type`, or ill-typed fields:
    ///   [`EnvelopeError::Malformed`]
    /// - a `type` outside the vocabulary or one only the server may send:
    ///   [`EnvelopeError::UnsupportedType`]
    pub fn decode(frame: &str) -> Result<Self, EnvelopeError> {
        let value: serde_json::Value =
            serde_json::from_str(frame).map_err(|_| EnvelopeError::Malformed)?;

        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(EnvelopeError::Malformed)?;

        match tag.parse::<EnvelopeKind>() {
            Ok(kind) if kind.is_client_bound() => {}
            _ => return Err(EnvelopeError::UnsupportedType(tag.to_string())),
        }

        serde_json::from_value(value).map_err(|_| EnvelopeError::Malformed)
    }
}

/// Envelope sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    AuthSuccess {
        #[serde(default, rename = "userId", skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    AuthError {
        message: String,
    },
    MessageSent {
        #[serde(rename = "sessionId")]
        session_id: String,
        content: String,
    },
    AiResponse {
        #[serde(rename = "sessionId")]
        session_id: String,
        content: String,
    },
    Error {
        message: String,
    },
}

impl ServerEnvelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            ServerEnvelope::AuthSuccess { .. } => EnvelopeKind::AuthSuccess,
            ServerEnvelope::AuthError { .. } => EnvelopeKind::AuthError,
            ServerEnvelope::MessageSent { .. } => EnvelopeKind::MessageSent,
            ServerEnvelope::AiResponse { .. } => EnvelopeKind::AiResponse,
            ServerEnvelope::Error { .. } => EnvelopeKind::Error,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEnvelope::Error {
            message: message.into(),
        }
    }

    pub fn auth_error(message: impl Into<String>) -> Self {
        ServerEnvelope::AuthError {
            message: message.into(),
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
