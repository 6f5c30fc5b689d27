//! In-memory collaborators shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lawhelp_types::chat::{ChatSession, ConversationTurn, TurnRole};
use lawhelp_types::envelope::ServerEnvelope;
use lawhelp_types::error::{AnswerError, AuthError, ChannelError, RepositoryError};
use lawhelp_types::identity::SubjectId;
use tokio::sync::mpsc;

use crate::answer::engine::AnswerEngine;
use crate::auth::verifier::IdentityVerifier;
use crate::chat::repository::{SessionStore, TurnPersister};
use crate::connection::channel::{Channel, InboundFrame};

/// Ordered log of side effects across collaborators.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct StoreInner {
    sessions: Vec<ChatSession>,
    turns: Vec<ConversationTurn>,
    fail_role: Option<TurnRole>,
}

/// Session store and turn persister backed by vectors.
#[derive(Clone, Default)]
pub struct InMemoryChatStore {
    inner: Arc<Mutex<StoreInner>>,
    journal: Journal,
}

impl InMemoryChatStore {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            inner: Arc::default(),
            journal,
        }
    }

    pub fn insert_session(&self, owner: SubjectId) -> ChatSession {
        let session = ChatSession::new(owner, None);
        self.inner.lock().unwrap().sessions.push(session.clone());
        session
    }

    /// Make every later append of `role` fail with a query error.
    pub fn fail_appends_for(&self, role: TurnRole) {
        self.inner.lock().unwrap().fail_role = Some(role);
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.inner.lock().unwrap().turns.clone()
    }
}

impl SessionStore for InMemoryChatStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.iter().any(|s| s.id == session.id) {
            return Err(RepositoryError::Conflict(session.id.clone()));
        }
        inner.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn list_sessions(
        &self,
        owner_id: &SubjectId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        let mut owned: Vec<ChatSession> = inner
            .sessions
            .iter()
            .filter(|s| s.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(i64::MAX) as usize)
            .collect())
    }
}

impl TurnPersister for InMemoryChatStore {
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_role == Some(turn.role) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        inner.turns.push(turn.clone());
        self.journal.record(format!("append:{}", turn.role));
        Ok(())
    }

    async fn list_turns(
        &self,
        session_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(i64::MAX) as usize)
            .cloned()
            .collect())
    }
}

/// What a [`ScriptedEngine`] does on every call.
#[derive(Debug, Clone)]
pub enum EngineScript {
    Answer(String),
    Fail(AnswerError),
    Hang,
}

#[derive(Clone)]
pub struct ScriptedEngine {
    script: EngineScript,
    calls: Arc<AtomicUsize>,
    journal: Journal,
}

impl ScriptedEngine {
    pub fn new(script: EngineScript, journal: Journal) -> Self {
        Self {
            script,
            calls: Arc::default(),
            journal,
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self::new(EngineScript::Answer(answer.to_string()), Journal::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnswerEngine for ScriptedEngine {
    async fn generate_answer(&self, _question: &str) -> Result<String, AnswerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record("engine");
        match &self.script {
            EngineScript::Answer(answer) => Ok(answer.clone()),
            EngineScript::Fail(err) => Err(err.clone()),
            EngineScript::Hang => std::future::pending().await,
        }
    }
}

/// Accepts a fixed set of tokens. `"<expired>"` always fails as expired.
pub struct StaticVerifier {
    tokens: HashMap<String, SubjectId>,
}

impl StaticVerifier {
    pub fn with_token(token: &str, subject: &str) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.to_string(), SubjectId::new(subject));
        Self { tokens }
    }

    pub fn and_token(mut self, token: &str, subject: &str) -> Self {
        self.tokens.insert(token.to_string(), SubjectId::new(subject));
        self
    }
}

impl IdentityVerifier for StaticVerifier {
    fn verify(&self, credential: &str) -> Result<SubjectId, AuthError> {
        if credential == "<expired>" {
            return Err(AuthError::Expired);
        }
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(AuthError::InvalidSignature)
    }
}

/// Channel driven from a test through a [`ChannelHandle`].
pub struct MockChannel {
    inbound: mpsc::UnboundedReceiver<Result<InboundFrame, ChannelError>>,
    outbound: mpsc::UnboundedSender<ServerEnvelope>,
    closes: Arc<AtomicUsize>,
    closed: bool,
    journal: Journal,
}

/// The peer side of a [`MockChannel`].
pub struct ChannelHandle {
    inbound: Option<mpsc::UnboundedSender<Result<InboundFrame, ChannelError>>>,
    outbound: mpsc::UnboundedReceiver<ServerEnvelope>,
    closes: Arc<AtomicUsize>,
}

pub fn mock_channel(journal: Journal) -> (MockChannel, ChannelHandle) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let closes = Arc::new(AtomicUsize::new(0));
    (
        MockChannel {
            inbound: in_rx,
            outbound: out_tx,
            closes: closes.clone(),
            closed: false,
            journal,
        },
        ChannelHandle {
            inbound: Some(in_tx),
            outbound: out_rx,
            closes,
        },
    )
}

impl Channel for MockChannel {
    async fn recv(&mut self) -> Option<Result<InboundFrame, ChannelError>> {
        if self.closed {
            return None;
        }
        self.inbound.recv().await
    }

    async fn send(&mut self, envelope: &ServerEnvelope) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .send(envelope.clone())
            .map_err(|_| ChannelError::Closed)?;
        self.journal.record(format!("send:{}", envelope.kind()));
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChannelHandle {
    pub fn send_text(&self, text: &str) {
        if let Some(tx) = &self.inbound {
            tx.send(Ok(InboundFrame::Text(text.to_string()))).unwrap();
        }
    }

    pub fn send_binary(&self, bytes: &[u8]) {
        if let Some(tx) = &self.inbound {
            tx.send(Ok(InboundFrame::Binary(bytes.to_vec()))).unwrap();
        }
    }

    /// Simulate the peer going away.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Next envelope the server sent, or `None` if nothing arrives in time.
    pub async fn next(&mut self) -> Option<ServerEnvelope> {
        tokio::time::timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}
