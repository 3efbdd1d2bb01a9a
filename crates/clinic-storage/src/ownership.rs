//! Ownership lookups for the authorization engine.

use async_trait::async_trait;
use clinic_auth::{AuthResult, OwnershipResolver, PatientId, ProviderId, UserId};

use crate::traits::ClinicStorage;

/// Adapts any [`ClinicStorage`] to the engine's [`OwnershipResolver`].
#[derive(Clone, Copy)]
pub struct StorageOwnership<'a> {
    storage: &'a dyn ClinicStorage,
}

impl<'a> StorageOwnership<'a> {
    #[must_use]
    pub fn new(storage: &'a dyn ClinicStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl OwnershipResolver for StorageOwnership<'_> {
    async fn patient_owner(&self, patient_id: PatientId) -> AuthResult<Option<UserId>> {
        Ok(self.storage.patient_owner(patient_id).await?)
    }

    async fn provider_owner(&self, provider_id: ProviderId) -> AuthResult<Option<UserId>> {
        Ok(self.storage.provider_owner(provider_id).await?)
    }

    async fn provider_for_user(&self, user_id: UserId) -> AuthResult<Option<ProviderId>> {
        Ok(self.storage.provider_for_user(user_id).await?)
    }
}
