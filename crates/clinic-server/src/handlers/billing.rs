use axum::{Json, extract::State, http::StatusCode};
use clinic_api::ApiResult;
use clinic_auth::{Action, BearerAuth, PatientId, ResourceRef};
use clinic_storage::{BillingId, BillingRecord, BillingStatusUpdate, BillingView, NewBilling};

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

pub async fn create_billing(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiJson(input): ApiJson<NewBilling>,
) -> ApiResult<(StatusCode, Json<BillingRecord>)> {
    state
        .authorize(
            &principal,
            Action::CreateBilling,
            ResourceRef::Patient(input.patient_id),
        )
        .await?;
    input.validate()?;
    let billing = state.storage.create_billing(&input).await?;
    Ok((StatusCode::CREATED, Json(billing)))
}

/// Sets status, payment method and payment date together.
pub async fn update_billing_status(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<BillingId>,
    ApiJson(update): ApiJson<BillingStatusUpdate>,
) -> ApiResult<Json<BillingRecord>> {
    state
        .authorize(&principal, Action::UpdateBilling, ResourceRef::None)
        .await?;
    update.validate()?;
    Ok(Json(state.storage.update_billing_status(id, &update).await?))
}

pub async fn list_patient_billing(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<PatientId>,
) -> ApiResult<Json<Vec<BillingView>>> {
    state
        .authorize(
            &principal,
            Action::ReadPatientBilling,
            ResourceRef::Patient(id),
        )
        .await?;
    Ok(Json(state.storage.list_patient_billing(id).await?))
}
