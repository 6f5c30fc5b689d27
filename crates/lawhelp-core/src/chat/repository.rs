//! SessionStore and TurnPersister trait definitions.
//!
//! The dispatcher needs exactly two operations from persistence: look up a
//! session and append a turn. The remaining methods serve session
//! management over HTTP and the CLI.

use lawhelp_types::chat::{ChatSession, ConversationTurn};
use lawhelp_types::error::RepositoryError;
use lawhelp_types::identity::SubjectId;

/// Repository trait for chat sessions.
///
/// Implementations live in lawhelp-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionStore: Send + Sync {
    /// Get a chat session by its id. `Ok(None)` when it does not exist.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// List sessions owned by a subject, most recently updated first.
    fn list_sessions(
        &self,
        owner_id: &SubjectId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;
}

/// Repository trait for conversation turns.
///
/// Turns are append-only: there is no update or delete.
pub trait TurnPersister: Send + Sync {
    /// Append one turn. Once this returns `Ok` the turn is committed.
    fn append_turn(
        &self,
        turn: &ConversationTurn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the turns of a session, ordered by created_at ASC.
    fn list_turns(
        &self,
        session_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationTurn>, RepositoryError>> + Send;
}
