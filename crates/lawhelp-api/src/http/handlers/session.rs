//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions               - Create a session owned by the caller
//! - GET  /api/v1/sessions               - List the caller's sessions
//! - GET  /api/v1/sessions/{id}/messages - Get the turns of an owned session

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use lawhelp_types::chat::{ChatSession, ConversationTurn};
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedSubject;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_SESSION_PAGE: i64 = 50;
const DEFAULT_MESSAGE_PAGE: i64 = 100;

/// Request body for POST /api/v1/sessions.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/v1/sessions - Create a session for the authenticated subject.
pub async fn create_session(
    State(state): State<AppState>,
    AuthenticatedSubject(subject): AuthenticatedSubject,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let Json(body) = body.unwrap_or_default();

    let session = state.chat_service.create_session(subject, body.title).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let href = format!("/api/v1/sessions/{}/messages", session.id);
    Ok(ApiResponse::created(session, request_id, elapsed).with_link("messages", &href))
}

/// GET /api/v1/sessions - List the authenticated subject's sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthenticatedSubject(subject): AuthenticatedSubject,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<ChatSession>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let (limit, offset) = query.resolve(DEFAULT_SESSION_PAGE);

    let sessions = state
        .chat_service
        .list_sessions(&subject, limit, offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(sessions, request_id, elapsed).with_link("self", "/api/v1/sessions"))
}

/// GET /api/v1/sessions/{id}/messages - Turns of a session, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    AuthenticatedSubject(subject): AuthenticatedSubject,
    Path(session_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<ConversationTurn>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    let (limit, offset) = query.resolve(DEFAULT_MESSAGE_PAGE);

    let turns = state
        .chat_service
        .transcript(&session_id, &subject, limit, offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(turns, request_id, elapsed))
}
