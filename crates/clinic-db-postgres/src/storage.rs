//! PostgreSQL implementation of the `ClinicStorage` trait.

use async_trait::async_trait;
use clinic_auth::{PatientId, ProviderId, UserId};
use clinic_storage::{
    AppointmentId, AppointmentRecord, AppointmentStatus, AppointmentStatusCount, BillingId,
    BillingRecord, BillingStatusUpdate, BillingView, ClinicStorage, DateRange, MedicalRecord,
    MedicalRecordView, NewAppointment, NewBilling, NewMedicalRecord, NewPrescription,
    PatientAppointmentView, PatientDetails, PatientRecord, PatientView, PrescriptionRecord,
    PrescriptionView, ProviderAppointmentView, ProviderView, RegistrationTransaction,
    RevenueByStatus, StorageError, StorageResult, UserRecord,
};
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgPool;

use crate::config::PostgresConfig;
use crate::error::map_query_error;
use crate::queries::{accounts, appointments, billing, clinical, profiles, reports};
use crate::transaction::PostgresRegistration;
use crate::{migrations, pool};

/// PostgreSQL record store.
///
/// Every call acquires a connection from the pool; the pool's acquire
/// timeout bounds how long a call waits.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new `PostgresStorage` with the given configuration.
    ///
    /// This will:
    /// 1. Create a connection pool
    /// 2. Run migrations (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresStorage` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ClinicStorage for PostgresStorage {
    async fn ping(&self) -> StorageResult<()> {
        let _: i32 = query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_query_error(e, "Health check failed"))?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>> {
        accounts::find_user_by_username(&self.pool, username).await
    }

    async fn begin_registration(&self) -> StorageResult<Box<dyn RegistrationTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            StorageError::transaction(format!("Failed to begin registration: {e}"))
        })?;
        Ok(Box::new(PostgresRegistration::new(tx)))
    }

    async fn patient_owner(&self, patient_id: PatientId) -> StorageResult<Option<UserId>> {
        accounts::patient_owner(&self.pool, patient_id).await
    }

    async fn provider_owner(&self, provider_id: ProviderId) -> StorageResult<Option<UserId>> {
        accounts::provider_owner(&self.pool, provider_id).await
    }

    async fn provider_for_user(&self, user_id: UserId) -> StorageResult<Option<ProviderId>> {
        accounts::provider_for_user(&self.pool, user_id).await
    }

    async fn list_patients(&self) -> StorageResult<Vec<PatientView>> {
        profiles::list_patients(&self.pool).await
    }

    async fn get_patient(&self, patient_id: PatientId) -> StorageResult<Option<PatientView>> {
        profiles::get_patient(&self.pool, patient_id).await
    }

    async fn update_patient(
        &self,
        patient_id: PatientId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord> {
        profiles::update_patient(&self.pool, patient_id, details).await
    }

    async fn list_providers(&self) -> StorageResult<Vec<ProviderView>> {
        profiles::list_providers(&self.pool).await
    }

    async fn get_provider(&self, provider_id: ProviderId) -> StorageResult<Option<ProviderView>> {
        profiles::get_provider(&self.pool, provider_id).await
    }

    async fn create_appointment(&self, input: &NewAppointment) -> StorageResult<AppointmentRecord> {
        appointments::create_appointment(&self.pool, input).await
    }

    async fn list_patient_appointments(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PatientAppointmentView>> {
        appointments::list_for_patient(&self.pool, patient_id).await
    }

    async fn list_provider_appointments(
        &self,
        provider_id: ProviderId,
    ) -> StorageResult<Vec<ProviderAppointmentView>> {
        appointments::list_for_provider(&self.pool, provider_id).await
    }

    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> StorageResult<AppointmentRecord> {
        appointments::update_status(&self.pool, appointment_id, status).await
    }

    async fn create_medical_record(&self, input: &NewMedicalRecord) -> StorageResult<MedicalRecord> {
        clinical::create_medical_record(&self.pool, input).await
    }

    async fn list_patient_medical_records(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<MedicalRecordView>> {
        clinical::list_medical_records(&self.pool, patient_id).await
    }

    async fn create_prescription(
        &self,
        provider_id: ProviderId,
        input: &NewPrescription,
    ) -> StorageResult<PrescriptionRecord> {
        clinical::create_prescription(&self.pool, provider_id, input).await
    }

    async fn list_patient_prescriptions(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PrescriptionView>> {
        clinical::list_prescriptions(&self.pool, patient_id).await
    }

    async fn create_billing(&self, input: &NewBilling) -> StorageResult<BillingRecord> {
        billing::create_billing(&self.pool, input).await
    }

    async fn update_billing_status(
        &self,
        billing_id: BillingId,
        update: &BillingStatusUpdate,
    ) -> StorageResult<BillingRecord> {
        billing::update_status(&self.pool, billing_id, update).await
    }

    async fn list_patient_billing(&self, patient_id: PatientId) -> StorageResult<Vec<BillingView>> {
        billing::list_for_patient(&self.pool, patient_id).await
    }

    async fn appointment_report(
        &self,
        range: &DateRange,
    ) -> StorageResult<Vec<AppointmentStatusCount>> {
        reports::appointment_counts(&self.pool, range).await
    }

    async fn revenue_report(&self, range: &DateRange) -> StorageResult<Vec<RevenueByStatus>> {
        reports::revenue_by_status(&self.pool, range).await
    }
}
