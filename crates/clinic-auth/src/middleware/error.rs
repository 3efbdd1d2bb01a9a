//! Error responses for rejected requests.
//!
//! `AuthError` renders through [`ApiError`] so every error response shares
//! one JSON shape.

use axum::response::{IntoResponse, Response};
use clinic_api::ApiError;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn unauthorized_carries_challenge() {
        let response = AuthError::unauthorized("Missing Authorization header").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn expired_token_is_401() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_has_empty_body() {
        let response = AuthError::forbidden("not the owner").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));
    }
}
