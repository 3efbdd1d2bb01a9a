//! Credential service: signed bearer tokens carrying the principal.

pub mod jwt;

pub use jwt::{DEFAULT_TOKEN_LIFETIME_SECS, JwtError, JwtService, TokenClaims};
