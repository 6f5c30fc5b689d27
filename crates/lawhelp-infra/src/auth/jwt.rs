//! HS256 JSON Web Token verification.
//!
//! Decoding, signature and `exp`/`nbf` checks go through `jsonwebtoken`. The
//! subject is read from the `userId` claim, falling back to `sub`. `exp` is
//! optional; when present it is checked with the configured leeway.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lawhelp_core::auth::verifier::IdentityVerifier;
use lawhelp_types::error::AuthError;
use lawhelp_types::identity::SubjectId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    #[serde(rename = "userId", default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    sub: Option<String>,
}

impl Claims {
    fn subject(&self) -> Option<String> {
        let user_id = match &self.user_id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        user_id
            .or_else(|| self.sub.clone())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Verifies bearer tokens signed with a shared HS256 secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier. An empty secret is a configuration error.
    pub fn new(secret: SecretString, leeway_secs: u64) -> Result<Self, AuthError> {
        if secret.expose_secret().is_empty() {
            return Err(AuthError::Misconfigured("empty JWT secret".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        validation.required_spec_claims.clear();

        Ok(Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        })
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<SubjectId, AuthError> {
        let token = credential.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                ErrorKind::InvalidAlgorithm => {
                    AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg))
                }
                _ => AuthError::Malformed(e.to_string()),
            })?;

        data.claims
            .subject()
            .map(SubjectId::new)
            .ok_or(AuthError::MissingSubject)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("key", &"[REDACTED]")
            .field("leeway_secs", &self.validation.leeway)
            .finish()
    }
}

/// Sign a claims object as an HS256 token.
///
/// Used by the CLI to mint development tokens and by tests.
pub fn sign_hs256(secret: &SecretString, claims: &serde_json::Value) -> Result<String, AuthError> {
    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn secret() -> SecretString {
        SecretString::from("test-signing-secret".to_string())
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(secret(), 0).unwrap()
    }

    fn token(claims: serde_json::Value) -> String {
        sign_hs256(&secret(), &claims).unwrap()
    }

    #[test]
    fn test_valid_token_yields_user_id() {
        let t = token(json!({"userId": "u1", "exp": now() + 60}));
        assert_eq!(verifier().verify(&t).unwrap(), SubjectId::new("u1"));
    }

    #[test]
    fn test_sub_claim_is_fallback() {
        let t = token(json!({"sub": "u7"}));
        assert_eq!(verifier().verify(&t).unwrap(), SubjectId::new("u7"));
    }

    #[test]
    fn test_numeric_user_id_is_accepted() {
        let t = token(json!({"userId": 42}));
        assert_eq!(verifier().verify(&t).unwrap(), SubjectId::new("42"));
    }

    #[test]
    fn test_fractional_exp_is_accepted() {
        let t = token(json!({"userId": "u1", "exp": 4_102_444_800.0}));
        assert_eq!(verifier().verify(&t).unwrap(), SubjectId::new("u1"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let t = token(json!({"userId": "u1", "exp": now() - 120}));
        assert_eq!(verifier().verify(&t).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn test_leeway_tolerates_small_skew() {
        let v = JwtVerifier::new(secret(), 30).unwrap();
        let t = token(json!({"userId": "u1", "exp": now() - 10}));
        assert!(v.verify(&t).is_ok());
    }

    #[test]
    fn test_not_yet_valid_rejected() {
        let t = token(json!({"userId": "u1", "nbf": now() + 120}));
        assert_eq!(verifier().verify(&t).unwrap_err(), AuthError::NotYetValid);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = SecretString::from("another-secret".to_string());
        let t = sign_hs256(&other, &json!({"userId": "u1"})).unwrap();
        assert_eq!(verifier().verify(&t).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let genuine = token(json!({"userId": "u1"}));
        let other = SecretString::from("another-secret".to_string());
        let forged = sign_hs256(&other, &json!({"userId": "admin"})).unwrap();

        let signature = genuine.rsplit('.').next().unwrap();
        let (forged_body, _) = forged.rsplit_once('.').unwrap();
        let tampered = format!("{forged_body}.{signature}");
        assert_eq!(
            verifier().verify(&tampered).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_padded_signature_rejected() {
        let t = token(json!({"userId": "u1"}));
        let padded = format!("{t}==");
        assert!(verifier().verify(&padded).is_err());
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let t = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &json!({"userId": "u1"}),
            &EncodingKey::from_secret(b"test-signing-secret"),
        )
        .unwrap();
        assert_eq!(
            verifier().verify(&t).unwrap_err(),
            AuthError::UnsupportedAlgorithm("HS512".to_string())
        );
    }

    #[test]
    fn test_missing_subject_rejected() {
        let t = token(json!({"exp": now() + 60}));
        assert_eq!(verifier().verify(&t).unwrap_err(), AuthError::MissingSubject);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        for bad in ["abc", "a.b", "a.b.c.d", "!!!.???.***"] {
            assert!(matches!(
                verifier().verify(bad).unwrap_err(),
                AuthError::Malformed(_)
            ));
        }
        assert_eq!(
            verifier().verify("  ").unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[test]
    fn test_empty_secret_is_misconfigured() {
        let err = JwtVerifier::new(SecretString::from(String::new()), 0).unwrap_err();
        assert!(matches!(err, AuthError::Misconfigured(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", verifier()).contains("test-signing-secret"));
    }
}
