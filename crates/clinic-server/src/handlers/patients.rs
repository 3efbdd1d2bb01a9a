use axum::{Json, extract::State};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{Action, BearerAuth, PatientId, ResourceRef};
use clinic_storage::{PatientDetails, PatientRecord, PatientView};

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

pub async fn list_patients(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
) -> ApiResult<Json<Vec<PatientView>>> {
    state
        .authorize(&principal, Action::ListPatients, ResourceRef::None)
        .await?;
    Ok(Json(state.storage.list_patients().await?))
}

pub async fn get_patient(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
) -> ApiResult<Json<PatientView>> {
    state
        .authorize(&principal, Action::ReadPatient, ResourceRef::Patient(id))
        .await?;
    state
        .storage
        .get_patient(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient not found"))
}

/// Replaces every demographic and insurance field.
pub async fn update_patient(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
    ApiJson(details): ApiJson<PatientDetails>,
) -> ApiResult<Json<PatientRecord>> {
    state
        .authorize(&principal, Action::UpdatePatient, ResourceRef::Patient(id))
        .await?;
    details.validate()?;
    Ok(Json(state.storage.update_patient(id, &details).await?))
}
