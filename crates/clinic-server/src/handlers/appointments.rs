use axum::{Json, extract::State, http::StatusCode};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{Action, BearerAuth, PatientId, ProviderId, ResourceRef};
use clinic_storage::{
    AppointmentId, AppointmentRecord, AppointmentStatus, NewAppointment, PatientAppointmentView,
    ProviderAppointmentView,
};
use serde::Deserialize;

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

/// Patients may only book for themselves; the self-check runs against
/// `patient_id` in the body.
pub async fn create_appointment(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiJson(input): ApiJson<NewAppointment>,
) -> ApiResult<(StatusCode, Json<AppointmentRecord>)> {
    state
        .authorize(
            &principal,
            Action::CreateAppointment,
            ResourceRef::Patient(input.patient_id),
        )
        .await?;
    let appointment = state.storage.create_appointment(&input).await?;
    tracing::info!(
        appointment_id = appointment.id,
        patient_id = appointment.patient_id,
        provider_id = appointment.provider_id,
        "Appointment created"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn list_patient_appointments(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
) -> ApiResult<Json<Vec<PatientAppointmentView>>> {
    state
        .authorize(
            &principal,
            Action::ReadPatientAppointments,
            ResourceRef::Patient(id),
        )
        .await?;
    Ok(Json(state.storage.list_patient_appointments(id).await?))
}

pub async fn list_provider_appointments(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<ProviderId>,
) -> ApiResult<Json<Vec<ProviderAppointmentView>>> {
    state
        .authorize(
            &principal,
            Action::ReadProviderAppointments,
            ResourceRef::Provider(id),
        )
        .await?;
    Ok(Json(state.storage.list_provider_appointments(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// The body is only shaped after authorization so that callers without the
/// role get 403 whatever they send.
pub async fn update_appointment_status(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<AppointmentId>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<AppointmentRecord>> {
    state
        .authorize(&principal, Action::UpdateAppointmentStatus, ResourceRef::None)
        .await?;
    let update: StatusUpdate = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid status update: {e}")))?;
    let status: AppointmentStatus = update.status.parse()?;
    Ok(Json(
        state.storage.update_appointment_status(id, status).await?,
    ))
}
