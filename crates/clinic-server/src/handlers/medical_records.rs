use axum::{Json, extract::State, http::StatusCode};
use clinic_api::ApiResult;
use clinic_auth::{Action, BearerAuth, PatientId, ResourceRef};
use clinic_storage::{MedicalRecord, MedicalRecordView, NewMedicalRecord};

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

pub async fn create_medical_record(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiJson(input): ApiJson<NewMedicalRecord>,
) -> ApiResult<(StatusCode, Json<MedicalRecord>)> {
    state
        .authorize(
            &principal,
            Action::CreateMedicalRecord,
            ResourceRef::Patient(input.patient_id),
        )
        .await?;
    input.validate()?;
    let record = state.storage.create_medical_record(&input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_patient_medical_records(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
) -> ApiResult<Json<Vec<MedicalRecordView>>> {
    state
        .authorize(
            &principal,
            Action::ReadPatientMedicalRecords,
            ResourceRef::Patient(id),
        )
        .await?;
    Ok(Json(state.storage.list_patient_medical_records(id).await?))
}
