//! HTTP middleware for authentication.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use clinic_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn whoami(BearerAuth(principal): BearerAuth) -> String {
//!     principal.username
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .with_state(AuthState::new(jwt_service));
//! ```

pub mod auth;
pub mod error;

pub use auth::{AuthState, BearerAuth};
