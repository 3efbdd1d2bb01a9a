//! Registration transaction for the in-memory store.
//!
//! Writes are buffered in the transaction and applied under a single write
//! lock on commit. Constraints are checked when a row is inserted and again
//! at commit, so a concurrent registration that committed first turns this
//! commit into a `Conflict` with nothing applied.

use std::sync::Arc;

use async_trait::async_trait;
use clinic_auth::UserId;
use clinic_storage::{
    NewUser, PatientDetails, PatientRecord, ProviderDetails, ProviderRecord,
    RegistrationTransaction, StorageError, StorageResult, UserRecord,
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::tables::{Sequences, Tables};

/// A pending registration.
pub struct InMemoryRegistration {
    tables: Arc<RwLock<Tables>>,
    sequences: Arc<Sequences>,
    user: Option<UserRecord>,
    patient: Option<PatientRecord>,
    provider: Option<ProviderRecord>,
}

impl InMemoryRegistration {
    pub(crate) fn new(tables: Arc<RwLock<Tables>>, sequences: Arc<Sequences>) -> Self {
        Self {
            tables,
            sequences,
            user: None,
            patient: None,
            provider: None,
        }
    }

    /// A profile may only reference the user of this transaction or an
    /// already committed one.
    fn check_user_reference(&self, tables: &Tables, user_id: UserId) -> StorageResult<()> {
        let pending = self.user.as_ref().is_some_and(|u| u.id == user_id);
        if pending || tables.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StorageError::missing_reference(format!("User {user_id} does not exist")))
        }
    }

    fn has_profile(&self) -> bool {
        self.patient.is_some() || self.provider.is_some()
    }
}

#[async_trait]
impl RegistrationTransaction for InMemoryRegistration {
    async fn insert_user(&mut self, user: &NewUser) -> StorageResult<UserRecord> {
        if self.user.is_some() {
            return Err(StorageError::transaction("User already inserted in this transaction"));
        }
        self.tables.read().await.check_username(&user.username)?;

        let record = UserRecord {
            id: self.sequences.next_user(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        self.user = Some(record.clone());
        Ok(record)
    }

    async fn insert_patient(
        &mut self,
        user_id: UserId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord> {
        if self.has_profile() {
            return Err(StorageError::conflict("User already has a profile"));
        }
        {
            let tables = self.tables.read().await;
            self.check_user_reference(&tables, user_id)?;
            tables.check_patient(Some(user_id), details.email.as_deref(), None)?;
        }

        let record = PatientRecord {
            id: self.sequences.next_patient(),
            user_id,
            details: details.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.patient = Some(record.clone());
        Ok(record)
    }

    async fn insert_provider(
        &mut self,
        user_id: UserId,
        details: &ProviderDetails,
    ) -> StorageResult<ProviderRecord> {
        if self.has_profile() {
            return Err(StorageError::conflict("User already has a profile"));
        }
        {
            let tables = self.tables.read().await;
            self.check_user_reference(&tables, user_id)?;
            tables.check_provider(user_id, details.email.as_deref())?;
        }

        let record = ProviderRecord {
            id: self.sequences.next_provider(),
            user_id,
            details: details.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.provider = Some(record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let Self {
            tables,
            user,
            patient,
            provider,
            ..
        } = *self;
        let mut tables = tables.write().await;

        // Re-check against rows committed since the inserts.
        if let Some(user) = &user {
            tables.check_username(&user.username)?;
        }
        if let Some(patient) = &patient {
            tables.check_patient(Some(patient.user_id), patient.details.email.as_deref(), None)?;
        }
        if let Some(provider) = &provider {
            tables.check_provider(provider.user_id, provider.details.email.as_deref())?;
        }

        if let Some(user) = user {
            tables.users.insert(user.id, user);
        }
        if let Some(patient) = patient {
            tables.patients.insert(patient.id, patient);
        }
        if let Some(provider) = provider {
            tables.providers.insert(provider.id, provider);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        tracing::debug!(
            username = self.user.as_ref().map(|u| u.username.as_str()),
            "Registration rolled back"
        );
        Ok(())
    }
}
