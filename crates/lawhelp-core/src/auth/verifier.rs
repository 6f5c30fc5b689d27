//! IdentityVerifier trait definition.

use lawhelp_types::error::AuthError;
use lawhelp_types::identity::SubjectId;

/// Validates a bearer credential and extracts the subject it was issued to.
///
/// Implementations must be pure and stateless: the same token yields the same
/// result until it expires. Implementations live in lawhelp-infra
/// (e.g., `JwtVerifier`).
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<SubjectId, AuthError>;
}

impl<T: IdentityVerifier + ?Sized> IdentityVerifier for std::sync::Arc<T> {
    fn verify(&self, credential: &str) -> Result<SubjectId, AuthError> {
        (**self).verify(credential)
    }
}
