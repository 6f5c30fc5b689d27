//! Message dispatcher for authenticated connections.
//!
//! Validates, authorizes, and sequences one `user_message` at a time:
//!
//! 1. envelope is a `user_message` with a non-blank `sessionId` and a
//!    non-empty `content` (whitespace-only content is a valid question)
//! 2. the session exists
//! 3. the session is owned by the connection's subject
//!
//! then persists the user turn, acknowledges it with `message_sent`, asks the
//! answer engine, persists the ai turn, and emits `ai_response`. Every
//! failure below the channel level becomes exactly one `error` envelope and
//! the connection stays usable. Committed turns are never rolled back.

use std::time::Duration;

use lawhelp_types::chat::{ConversationTurn, TurnRole};
use lawhelp_types::envelope::{ClientEnvelope, ServerEnvelope};
use lawhelp_types::error::{ChannelError, DispatchError};
use tracing::{debug, info, warn};

use crate::answer::engine::{AnswerEngine, generate_with_timeout};
use crate::chat::repository::{SessionStore, TurnPersister};
use crate::connection::channel::Channel;
use crate::connection::state::AuthenticatedContext;

/// Default upper bound on one answer engine call.
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(60);

/// Routes authenticated envelopes to persistence and the answer engine.
///
/// Generic over the session store, turn persister, and answer engine so
/// lawhelp-core never depends on lawhelp-infra.
pub struct MessageDispatcher<S: SessionStore, P: TurnPersister, A: AnswerEngine> {
    sessions: S,
    turns: P,
    engine: A,
    answer_timeout: Duration,
}

impl<S: SessionStore, P: TurnPersister, A: AnswerEngine> MessageDispatcher<S, P, A> {
    pub fn new(sessions: S, turns: P, engine: A) -> Self {
        Self {
            sessions,
            turns,
            engine,
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
        }
    }

    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = timeout;
        self
    }

    /// Access the answer engine (shared with the HTTP debug endpoint).
    pub fn engine(&self) -> &A {
        &self.engine
    }

    /// Dispatch one decoded envelope.
    ///
    /// Returns `Err` only when the channel itself failed; the caller must
    /// then end the connection.
    pub async fn dispatch<C: Channel>(
        &self,
        envelope: ClientEnvelope,
        ctx: &mut AuthenticatedContext,
        channel: &mut C,
    ) -> Result<(), ChannelError> {
        match self.handle(envelope, ctx, channel).await {
            Ok(()) => Ok(()),
            Err(DispatchError::Channel(err)) => Err(err),
            Err(err) => {
                warn!(subject_id = %ctx.subject_id, error = %err, "Dispatch failed");
                channel
                    .send(&ServerEnvelope::error(err.client_message()))
                    .await
            }
        }
    }

    async fn handle<C: Channel>(
        &self,
        envelope: ClientEnvelope,
        ctx: &mut AuthenticatedContext,
        channel: &mut C,
    ) -> Result<(), DispatchError> {
        let (session_id, content) = match envelope {
            ClientEnvelope::Auth { .. } => return Err(DispatchError::AlreadyAuthenticated),
            ClientEnvelope::UserMessage {
                session_id,
                content,
            } => match (session_id, content) {
                (Some(session_id), Some(content))
                    if !session_id.trim().is_empty() && !content.is_empty() =>
                {
                    (session_id, content)
                }
                _ => return Err(DispatchError::MissingFields),
            },
        };

        let session = self
            .sessions
            .get_session(&session_id)
            .await?
            .ok_or_else(|| DispatchError::SessionNotFound(session_id.clone()))?;

        if !session.is_owned_by(&ctx.subject_id) {
            return Err(DispatchError::Unauthorized(session_id));
        }
        ctx.session_id = Some(session_id.clone());

        let user_turn = ConversationTurn::new(
            session_id.as_str(),
            ctx.subject_id.clone(),
            TurnRole::User,
            content.as_str(),
        );
        self.turns.append_turn(&user_turn).await?;
        debug!(%session_id, turn_id = %user_turn.id, "User turn committed");

        channel
            .send(&ServerEnvelope::MessageSent {
                session_id: session_id.clone(),
                content: content.clone(),
            })
            .await?;

        let answer = generate_with_timeout(&self.engine, &content, self.answer_timeout).await?;

        let ai_turn = ConversationTurn::new(
            session_id.as_str(),
            ctx.subject_id.clone(),
            TurnRole::Ai,
            answer.as_str(),
        );
        self.turns.append_turn(&ai_turn).await?;
        info!(%session_id, turn_id = %ai_turn.id, "Answer committed");

        channel
            .send(&ServerEnvelope::AiResponse {
                session_id,
                content: answer,
            })
            .await?;

        Ok(())
    }
}
