//! Bearer token authentication extractor.
//!
//! Extracts the JWT from `Authorization: Bearer <token>` and verifies it with
//! the same verifier the WebSocket handshake uses.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lawhelp_core::auth::verifier::IdentityVerifier;
use lawhelp_types::identity::SubjectId;

use crate::http::error::AppError;
use crate::state::AppState;

/// The verified subject of the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject(pub SubjectId);

impl FromRequestParts<AppState> for AuthenticatedSubject {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let subject = state.verifier.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AppError::from(e)
        })?;
        Ok(AuthenticatedSubject(subject))
    }
}

/// Extract the bearer token from request headers.
fn extract_bearer_token(parts: &Parts) -> Result<String, AppError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
            )
        })?;
    let auth_str = auth.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}
