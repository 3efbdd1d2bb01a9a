use axum::{Json, extract::State, http::StatusCode};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{Action, BearerAuth, PatientId, ResourceRef};
use clinic_storage::{NewPrescription, PrescriptionRecord, PrescriptionView};

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

/// The prescribing provider is the caller's own provider row. A
/// `provider_id` in the body is ignored.
pub async fn create_prescription(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiJson(input): ApiJson<NewPrescription>,
) -> ApiResult<(StatusCode, Json<PrescriptionRecord>)> {
    let allowed = state
        .authorize(
            &principal,
            Action::CreatePrescription,
            ResourceRef::Patient(input.patient_id),
        )
        .await?;
    let provider_id = allowed
        .acting_provider
        .ok_or_else(|| ApiError::forbidden("no provider record"))?;

    input.validate()?;
    let prescription = state.storage.create_prescription(provider_id, &input).await?;
    tracing::info!(
        prescription_id = prescription.id,
        provider_id,
        patient_id = prescription.patient_id,
        "Prescription created"
    );
    Ok((StatusCode::CREATED, Json(prescription)))
}

pub async fn list_patient_prescriptions(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
) -> ApiResult<Json<Vec<PrescriptionView>>> {
    state
        .authorize(
            &principal,
            Action::ReadPatientPrescriptions,
            ResourceRef::Patient(id),
        )
        .await?;
    Ok(Json(state.storage.list_patient_prescriptions(id).await?))
}
