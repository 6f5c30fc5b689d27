use thiserror::Error;

/// Fallback text for failures whose details carry no value for the client.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong on the server.";

/// Errors decoding an inbound protocol frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Invalid message format")]
    Malformed,

    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),
}

/// Errors verifying a bearer credential. Always fatal to the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token has no subject claim")]
    MissingSubject,

    #[error("verifier misconfigured: {0}")]
    Misconfigured(String),
}

/// Errors from repository operations (used by trait definitions in lawhelp-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the answer engine.
#[derive(Debug, Clone, Error)]
pub enum AnswerError {
    #[error("The legal assistant did not answer within {0} seconds")]
    Timeout(u64),

    #[error("The legal assistant is unavailable: {0}")]
    Provider(String),

    #[error("The legal assistant rejected the question: {0}")]
    InvalidRequest(String),
}

/// Errors on the bidirectional channel itself. These end the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("channel I/O error: {0}")]
    Io(String),

    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

/// Recoverable failures while dispatching an authenticated envelope.
///
/// Each variant except [`DispatchError::Channel`] becomes exactly one `error`
/// envelope and leaves the connection open.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Protocol(#[from] EnvelopeError),

    #[error("Invalid message format or missing required fields")]
    MissingFields,

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    #[error("Session ID {0} does not exist")]
    SessionNotFound(String),

    #[error("User not authorized for session {0}")]
    Unauthorized(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] RepositoryError),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl DispatchError {
    /// Text placed in the outbound `error` envelope.
    pub fn client_message(&self) -> String {
        match self {
            DispatchError::Persistence(_) | DispatchError::Channel(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}
