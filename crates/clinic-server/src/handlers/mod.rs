//! HTTP handlers.
//!
//! Every protected handler follows the same steps: extract the principal,
//! authorize the action against the resource it targets, run one store
//! call, shape the response.

pub mod appointments;
pub mod auth;
pub mod billing;
pub mod medical_records;
pub mod patients;
pub mod prescriptions;
pub mod providers;
pub mod reports;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use clinic_api::ApiError;
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "message": "Healthcare API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/login",
            "register": "/api/register",
            "patients": "/api/patients",
            "providers": "/api/providers",
            "appointments": "/api/appointments",
            "reports": "/api/reports",
        },
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready when the store answers.
pub async fn readyz(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.storage.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        ApiError::service_unavailable("Record store unavailable")
    })?;
    Ok((StatusCode::OK, Json(HealthResponse { status: "ready" })))
}
