//! Registration transaction backed by a PostgreSQL transaction.

use async_trait::async_trait;
use clinic_auth::UserId;
use clinic_storage::{
    NewUser, PatientDetails, PatientRecord, ProviderDetails, ProviderRecord,
    RegistrationTransaction, StorageError, StorageResult, UserRecord,
};
use sqlx_postgres::PgTransaction;

use crate::queries::accounts;

/// A registration in progress.
///
/// The underlying sqlx transaction rolls back on drop if not explicitly
/// committed.
pub struct PostgresRegistration {
    /// `None` once committed or rolled back.
    tx: Option<PgTransaction<'static>>,
}

impl PostgresRegistration {
    pub(crate) fn new(tx: PgTransaction<'static>) -> Self {
        Self { tx: Some(tx) }
    }

    fn tx(&mut self) -> StorageResult<&mut PgTransaction<'static>> {
        self.tx.as_mut().ok_or_else(|| {
            StorageError::transaction("Transaction already completed (committed or rolled back)")
        })
    }
}

#[async_trait]
impl RegistrationTransaction for PostgresRegistration {
    async fn insert_user(&mut self, user: &NewUser) -> StorageResult<UserRecord> {
        accounts::insert_user(self.tx()?, user).await
    }

    async fn insert_patient(
        &mut self,
        user_id: UserId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord> {
        accounts::insert_patient(self.tx()?, user_id, details).await
    }

    async fn insert_provider(
        &mut self,
        user_id: UserId,
        details: &ProviderDetails,
    ) -> StorageResult<ProviderRecord> {
        accounts::insert_provider(self.tx()?, user_id, details).await
    }

    async fn commit(mut self: Box<Self>) -> StorageResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(|e| {
                StorageError::transaction(format!("Failed to commit registration: {e}"))
            })?;
            tracing::debug!("Registration committed");
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StorageResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await.map_err(|e| {
                StorageError::transaction(format!("Failed to roll back registration: {e}"))
            })?;
            tracing::debug!("Registration rolled back");
        }
        Ok(())
    }
}
