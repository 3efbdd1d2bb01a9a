use axum::{Json, extract::State};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{Action, BearerAuth, ProviderId, ResourceRef};
use clinic_storage::ProviderView;

use crate::extract::ApiPath;
use crate::server::AppState;

pub async fn list_providers(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
) -> ApiResult<Json<Vec<ProviderView>>> {
    state
        .authorize(&principal, Action::ListProviders, ResourceRef::None)
        .await?;
    Ok(Json(state.storage.list_providers().await?))
}

pub async fn get_provider(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiPath(id): ApiPath<ProviderId>,
) -> ApiResult<Json<ProviderView>> {
    state
        .authorize(&principal, Action::ReadProvider, ResourceRef::Provider(id))
        .await?;
    state
        .storage
        .get_provider(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Provider not found"))
}
