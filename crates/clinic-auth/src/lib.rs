//! # clinic-auth
//!
//! Authentication and authorization for the clinic server.
//!
//! This crate provides:
//! - [`types`] - the closed [`Role`] enumeration and the authenticated [`Principal`]
//! - [`token`] - the credential service issuing and verifying signed tokens
//! - [`password`] - Argon2id password hashing
//! - [`policy`] - the authorization engine: a static role/action policy table
//!   plus ownership self-checks resolved through [`OwnershipResolver`]
//! - [`middleware`] - the `BearerAuth` axum extractor
//!
//! ## Overview
//!
//! Every protected request goes through the same steps: the bearer token is
//! verified into a [`Principal`], the handler names the [`Action`] it is about
//! to perform and the [`ResourceRef`] it targets, and the [`PolicyEngine`]
//! decides before any store read or write happens.

pub mod error;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;
pub mod types;

pub use error::AuthError;
pub use middleware::{AuthState, BearerAuth};
pub use password::{hash_password, verify_password, verify_password_or_dummy};
pub use policy::{
    AccessDecision, Action, Allowed, DenyReason, Grant, OwnershipResolver, PolicyEngine,
    ResourceRef, grant_for,
};
pub use token::jwt::{JwtError, JwtService, TokenClaims};
pub use types::{PatientId, Principal, ProviderId, Role, UnknownRole, UserId};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
