//! Chat service for session management outside the live protocol.
//!
//! ChatService backs the REST endpoints and CLI commands: creating sessions
//! before a client's first `user_message`, listing a subject's sessions, and
//! reading back a transcript with the same ownership rule the dispatcher
//! enforces.

use lawhelp_types::chat::{ChatSession, ConversationTurn};
use lawhelp_types::error::RepositoryError;
use lawhelp_types::identity::SubjectId;
use thiserror::Error;
use tracing::info;

use crate::chat::repository::{SessionStore, TurnPersister};

/// Errors reading a session on behalf of a subject.
#[derive(Debug, Error)]
pub enum SessionAccessError {
    #[error("Session ID {0} does not exist")]
    NotFound(String),

    #[error("User not authorized for session {0}")]
    Forbidden(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrates session creation and retrieval.
///
/// Generic over one repository implementing both persistence traits, to keep
/// lawhelp-core independent of lawhelp-infra.
pub struct ChatService<R: SessionStore + TurnPersister> {
    repo: R,
}

impl<R: SessionStore + TurnPersister> ChatService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create a new session owned by `owner_id`.
    pub async fn create_session(
        &self,
        owner_id: SubjectId,
        title: Option<String>,
    ) -> Result<ChatSession, RepositoryError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let session = ChatSession::new(owner_id, title);
        let created = self.repo.create_session(&session).await?;
        info!(session_id = %created.id, owner_id = %created.owner_id, "Session created");
        Ok(created)
    }

    /// List a subject's sessions, most recent first.
    pub async fn list_sessions(
        &self,
        owner_id: &SubjectId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        self.repo.list_sessions(owner_id, limit, offset).await
    }

    /// Fetch a session, requiring that `requester` owns it.
    pub async fn get_owned_session(
        &self,
        session_id: &str,
        requester: &SubjectId,
    ) -> Result<ChatSession, SessionAccessError> {
        let session = self
            .repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| SessionAccessError::NotFound(session_id.to_string()))?;

        if !session.is_owned_by(requester) {
            return Err(SessionAccessError::Forbidden(session_id.to_string()));
        }
        Ok(session)
    }

    /// Read a session's turns in order, requiring ownership.
    pub async fn transcript(
        &self,
        session_id: &str,
        requester: &SubjectId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ConversationTurn>, SessionAccessError> {
        self.get_owned_session(session_id, requester).await?;
        Ok(self.repo.list_turns(session_id, limit, offset).await?)
    }

    /// Read a session's turns in order without an ownership check (CLI use).
    pub async fn transcript_unchecked(
        &self,
        session_id: &str,
    ) -> Result<Vec<ConversationTurn>, SessionAccessError> {
        if self.repo.get_session(session_id).await?.is_none() {
            return Err(SessionAccessError::NotFound(session_id.to_string()));
        }
        Ok(self.repo.list_turns(session_id, None, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryChatStore;
    use lawhelp_types::chat::TurnRole;

    #[tokio::test]
    async fn test_create_session_trims_blank_title() {
        let service = ChatService::new(InMemoryChatStore::default());
        let session = service
            .create_session(SubjectId::new("u1"), Some("   ".to_string()))
            .await
            .unwrap();
        assert!(session.title.is_none());
        assert_eq!(session.owner_id, SubjectId::new("u1"));
    }

    #[tokio::test]
    async fn test_list_sessions_only_returns_owned() {
        let service = ChatService::new(InMemoryChatStore::default());
        service
            .create_session(SubjectId::new("u1"), Some("Theft".to_string()))
            .await
            .unwrap();
        service
            .create_session(SubjectId::new("u2"), None)
            .await
            .unwrap();

        let mine = service
            .list_sessions(&SubjectId::new("u1"), None, None)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title.as_deref(), Some("Theft"));
    }

    #[tokio::test]
    async fn test_transcript_enforces_ownership() {
        let store = InMemoryChatStore::default();
        let service = ChatService::new(store.clone());
        let session = service
            .create_session(SubjectId::new("u2"), None)
            .await
            .unwrap();

        let err = service
            .transcript(&session.id, &SubjectId::new("u1"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionAccessError::Forbidden(_)));

        let err = service
            .transcript("missing-id", &SubjectId::new("u1"), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Session ID missing-id does not exist");
    }

    #[tokio::test]
    async fn test_transcript_returns_turns_in_order() {
        let store = InMemoryChatStore::default();
        let service = ChatService::new(store.clone());
        let owner = SubjectId::new("u1");
        let session = service.create_session(owner.clone(), None).await.unwrap();

        store
            .append_turn(&ConversationTurn::new(&session.id, owner.clone(), TurnRole::User, "q"))
            .await
            .unwrap();
        store
            .append_turn(&ConversationTurn::new(&session.id, owner.clone(), TurnRole::Ai, "a"))
            .await
            .unwrap();

        let turns = service
            .transcript(&session.id, &owner, None, None)
            .await
            .unwrap();
        let roles: Vec<TurnRole> = turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::Ai]);
    }
}
