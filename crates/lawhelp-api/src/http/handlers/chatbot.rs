//! Direct question endpoint.
//!
//! POST /api/v1/chatbot/ask runs one question through the answer engine
//! without a session. Nothing is persisted.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use lawhelp_core::answer::engine::generate_with_timeout;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedSubject;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /api/v1/chatbot/ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /api/v1/chatbot/ask - Answer one question.
pub async fn ask(
    State(state): State<AppState>,
    AuthenticatedSubject(subject): AuthenticatedSubject,
    Json(body): Json<AskRequest>,
) -> Result<ApiResponse<AskResponse>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let question = body
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Question is required".to_string()))?;

    tracing::info!(subject_id = %subject, chars = question.len(), "Direct question");
    let answer =
        generate_with_timeout(state.answer_engine.as_ref(), question, state.answer_timeout)
            .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(AskResponse { answer }, request_id, elapsed))
}
