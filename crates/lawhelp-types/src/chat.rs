//! Chat session and conversation turn types for LawHelp.
//!
//! A session is a conversation thread owned by exactly one subject. Turns are
//! immutable once created and are ordered by `created_at` within a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::identity::SubjectId;

/// Author of a conversation turn.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'ai'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Ai,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "ai" => Ok(TurnRole::Ai),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A conversation thread owned by one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub owner_id: SubjectId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a fresh session with a time-sortable id.
    pub fn new(owner_id: SubjectId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            owner_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, subject: &SubjectId) -> bool {
        &self.owner_id == subject
    }
}

/// One persisted message, authored by either the subject or the answer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub session_id: String,
    pub subject_id: SubjectId,
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Build a turn stamped with the current time.
    pub fn new(
        session_id: impl Into<String>,
        subject_id: SubjectId,
        role: TurnRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            session_id: session_id.into(),
            subject_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_roundtrip() {
        for role in [TurnRole::User, TurnRole::Ai] {
            let parsed: TurnRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("assistant".parse::<TurnRole>().is_err());
    }

    #[test]
    fn test_turn_role_serde() {
        assert_eq!(serde_json::to_string(&TurnRole::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn test_session_ownership() {
        let session = ChatSession::new(SubjectId::new("u1"), None);
        assert!(session.is_owned_by(&SubjectId::new("u1")));
        assert!(!session.is_owned_by(&SubjectId::new("u2")));
    }

    #[test]
    fn test_new_turn_ids_are_unique() {
        let a = ConversationTurn::new("s1", SubjectId::new("u1"), TurnRole::User, "hi");
        let b = ConversationTurn::new("s1", SubjectId::new("u1"), TurnRole::User, "hi");
        assert_ne!(a.id, b.id);
        assert!(a.created_at <= b.created_at);
    }
}
