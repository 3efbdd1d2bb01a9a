//! Bearer token authentication extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::token::jwt::{JwtError, JwtService};
use crate::types::Principal;

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Made available to the [`BearerAuth`] extractor through `FromRef` on the
/// application state.
#[derive(Clone)]
pub struct AuthState {
    /// Credential service used to verify tokens.
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    #[must_use]
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that verifies the `Authorization: Bearer <token>` header
/// and yields the [`Principal`] it carries.
///
/// # Errors
///
/// Rejects with a 401 `AuthError` when the header is missing, uses another
/// scheme, carries an empty token, or the token fails verification.
#[derive(Debug, Clone)]
pub struct BearerAuth(pub Principal);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| AuthError::unauthorized("Malformed Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::unauthorized("Expected Bearer token"))?
            .trim();

        if token.is_empty() {
            return Err(AuthError::unauthorized("Empty Bearer token"));
        }

        let principal = auth_state.jwt_service.verify(token).map_err(|e| {
            if !matches!(e, JwtError::Expired) {
                tracing::debug!(error = %e, "Failed to verify token");
            }
            AuthError::from(e)
        })?;

        Ok(BearerAuth(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::jwt::TokenClaims;
    use crate::types::Role;
    use axum::http::Request;

    const SECRET: &[u8] = b"test-secret-with-at-least-thirty-two-bytes";

    fn state() -> AuthState {
        AuthState::new(Arc::new(JwtService::new(SECRET, "clinic")))
    }

    async fn extract(header: Option<&str>) -> Result<BearerAuth, AuthError> {
        let mut builder = Request::builder().uri("/api/patients");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        BearerAuth::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn valid_token_yields_principal() {
        let principal = Principal::new(1, "alice", Role::Patient);
        let token = state().jwt_service.issue(&principal).unwrap();

        let BearerAuth(extracted) = extract(Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(extracted, principal);
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let err = extract(None).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn other_scheme_rejected() {
        let err = extract(Some("Basic YWxpY2U6cHcx")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn empty_token_rejected() {
        let err = extract(Some("Bearer  ")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn forged_token_rejected() {
        let other = JwtService::new(b"another-secret-with-at-least-thirty-two-b", "clinic");
        let token = other
            .issue(&Principal::new(1, "alice", Role::Admin))
            .unwrap();

        let err = extract(Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let service = JwtService::new(SECRET, "clinic");
        let claims = TokenClaims::for_principal(&Principal::new(1, "alice", Role::Patient), "clinic", -3600);
        let token = service.encode(&claims).unwrap();

        let err = extract(Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }
}
