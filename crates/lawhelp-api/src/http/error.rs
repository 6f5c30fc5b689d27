//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lawhelp_core::chat::service::SessionAccessError;
use lawhelp_types::error::{AnswerError, AuthError, GENERIC_FAILURE_MESSAGE, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session lookup failed on behalf of a caller.
    Session(SessionAccessError),
    /// Persistence failure.
    Repository(RepositoryError),
    /// The answer engine failed or timed out.
    Answer(AnswerError),
    /// Missing or rejected bearer token.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<SessionAccessError> for AppError {
    fn from(e: SessionAccessError) -> Self {
        AppError::Session(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl From<AnswerError> for AppError {
    fn from(e: AnswerError) -> Self {
        AppError::Answer(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Misconfigured(msg) => AppError::Internal(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl AppError {
    /// Status, machine-readable code, and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Session(e @ SessionAccessError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
            }
            AppError::Session(e @ SessionAccessError::Forbidden(_)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            AppError::Session(SessionAccessError::Repository(e)) | AppError::Repository(e) => {
                tracing::error!(error = %e, "Repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    GENERIC_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::Answer(AnswerError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Answer(e) => (StatusCode::BAD_GATEWAY, "ANSWER_ENGINE_ERROR", e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_map_to_404_and_403() {
        let (status, code, message) =
            AppError::from(SessionAccessError::NotFound("s1".to_string())).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "SESSION_NOT_FOUND");
        assert_eq!(message, "Session ID s1 does not exist");

        let (status, _, message) =
            AppError::from(SessionAccessError::Forbidden("s1".to_string())).parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message, "User not authorized for session s1");
    }

    #[test]
    fn test_repository_details_are_hidden() {
        let (status, _, message) =
            AppError::from(RepositoryError::Query("disk I/O error".to_string())).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_engine_failure_is_bad_gateway() {
        let (status, _, message) =
            AppError::from(AnswerError::Provider("rate limited".to_string())).parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(message, "The legal assistant is unavailable: rate limited");

        let (status, _, _) = AppError::from(AnswerError::Timeout(60)).parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let (status, _, _) = AppError::from(AuthError::Expired).parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = AppError::from(AuthError::Misconfigured("x".to_string())).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
