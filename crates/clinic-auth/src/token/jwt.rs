//! JWT token generation and validation.
//!
//! Tokens are signed with HS256 using a shared secret and carry the
//! principal `{id, username, role}` next to the standard `iss`, `iat` and
//! `exp` claims.
//!
//! ## Example
//!
//! ```ignore
//! use clinic_auth::token::jwt::JwtService;
//!
//! let jwt_service = JwtService::new(secret.as_bytes(), "clinic");
//! let token = jwt_service.issue(&principal)?;
//! let principal = jwt_service.verify(&token)?;
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{Principal, Role, UserId};

/// Token lifetime used when none is configured (one hour).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer | ErrorKind::MissingRequiredClaim(_) => {
                Self::invalid_claims(err.to_string())
            }
            // Unknown role strings surface here as JSON errors.
            ErrorKind::Json(_) => Self::invalid_claims(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for crate::AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::TokenExpired,
            JwtError::EncodingError { message } => Self::internal(message),
            other => Self::invalid_token(other.to_string()),
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// User ID.
    pub id: UserId,

    /// Username for display/logging.
    pub username: String,

    /// User's role at the time of login.
    pub role: Role,

    /// Issuer.
    pub iss: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// Builds claims for a principal expiring `lifetime_secs` from now.
    #[must_use]
    pub fn for_principal(principal: &Principal, issuer: impl Into<String>, lifetime_secs: i64) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            id: principal.id,
            username: principal.username.clone(),
            role: principal.role,
            iss: issuer.into(),
            iat: now,
            exp: now.saturating_add(lifetime_secs),
        }
    }

    /// Returns the principal carried by these claims.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.role)
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Service for issuing and verifying bearer tokens.
///
/// This service is thread-safe (`Send + Sync`) and is shared across handlers
/// behind an `Arc`.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime_secs: i64,
}

impl JwtService {
    /// Creates a new JWT service signing with the given shared secret.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }

    /// Overrides the token lifetime.
    #[must_use]
    pub fn with_lifetime_secs(mut self, lifetime_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self
    }

    /// Issues a signed token for the principal.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(&self, principal: &Principal) -> Result<String, JwtError> {
        let claims = TokenClaims::for_principal(principal, &self.issuer, self.lifetime_secs);
        self.encode(&claims)
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a JWT string.
    ///
    /// # Errors
    /// Returns an error if the signature, issuer or expiry is invalid.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        Ok(decode::<TokenClaims>(token, &self.decoding_key, &validation)?.claims)
    }

    /// Verifies a token and returns the principal it carries.
    ///
    /// # Errors
    /// Returns an error if the token does not decode and validate.
    pub fn verify(&self, token: &str) -> Result<Principal, JwtError> {
        self.decode(token).map(|claims| claims.principal())
    }

    /// Returns the issuer claim value.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the configured token lifetime.
    #[must_use]
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-with-at-least-thirty-two-bytes";

    fn alice() -> Principal {
        Principal::new(7, "alice", Role::Patient)
    }

    #[test]
    fn test_issue_and_verify() {
        let service = JwtService::new(SECRET, "clinic");
        let token = service.issue(&alice()).unwrap();
        assert!(!token.is_empty());

        let principal = service.verify(&token).unwrap();
        assert_eq!(principal, alice());
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let claims = TokenClaims::for_principal(&alice(), "clinic", i64::MAX);
        assert_eq!(claims.exp, i64::MAX);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_default_lifetime_is_one_hour() {
        let service = JwtService::new(SECRET, "clinic");
        let token = service.issue(&alice()).unwrap();
        let claims = service.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(SECRET, "clinic");
        let claims = TokenClaims::for_principal(&alice(), "clinic", -3600);
        let token = service.encode(&claims).unwrap();

        let result = service.decode(&token);
        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let service1 = JwtService::new(SECRET, "clinic");
        let service2 = JwtService::new(b"another-secret-with-at-least-thirty-two-b", "clinic");

        let token = service1.issue(&alice()).unwrap();
        let result = service2.verify(&token);
        assert!(matches!(result.unwrap_err(), JwtError::InvalidSignature));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuing = JwtService::new(SECRET, "someone-else");
        let verifying = JwtService::new(SECRET, "clinic");

        let token = issuing.issue(&alice()).unwrap();
        assert!(matches!(
            verifying.verify(&token).unwrap_err(),
            JwtError::InvalidClaims { .. }
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = JwtService::new(SECRET, "clinic");
        assert!(service.verify("not.a.jwt").is_err());
        assert!(service.verify("").is_err());
    }

    #[test]
    fn test_claims_serialization() {
        let claims = TokenClaims::for_principal(&alice(), "clinic", 60);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "patient");
    }

    #[test]
    fn test_jwt_error_maps_to_auth_error() {
        use crate::AuthError;
        assert!(matches!(AuthError::from(JwtError::Expired), AuthError::TokenExpired));
        assert!(matches!(
            AuthError::from(JwtError::InvalidSignature),
            AuthError::InvalidToken { .. }
        ));
    }
}
