use axum::{Json, extract::State, http::StatusCode};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{AuthError, Principal, Role, verify_password_or_dummy};
use serde::{Deserialize, Serialize};

use crate::extract::ApiJson;
use crate::registration::{self, RegisterRequest, Registered};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub user: Registered,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = registration::register(state.storage.as_ref(), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// Unknown users and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .storage
        .find_user_by_username(&request.username)
        .await?;

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = request.password;
    let verified = tokio::task::spawn_blocking(move || {
        verify_password_or_dummy(&password, stored_hash.as_deref())
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Password verification task failed");
        ApiError::internal("Internal server error")
    })?
    .map_err(|e| {
        tracing::error!(error = %e, "Stored password hash is malformed");
        ApiError::internal("Internal server error")
    })?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::debug!(username = %request.username, "Login failed");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let principal = Principal::new(user.id, user.username, user.role);
    let token = state.jwt_service.issue(&principal).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue token");
        ApiError::internal("Internal server error")
    })?;

    tracing::info!(user_id = principal.id, role = %principal.role, "User logged in");
    Ok(Json(LoginResponse {
        token,
        role: principal.role,
    }))
}
