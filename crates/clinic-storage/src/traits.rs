//! Storage traits implemented by every record store backend.

use async_trait::async_trait;
use clinic_auth::{PatientId, ProviderId, UserId};

use crate::StorageResult;
use crate::types::{
    AppointmentId, AppointmentRecord, AppointmentStatus, AppointmentStatusCount, BillingId,
    BillingRecord, BillingStatusUpdate, BillingView, DateRange, MedicalRecord, MedicalRecordView,
    NewAppointment, NewBilling, NewMedicalRecord, NewPrescription, NewUser, PatientAppointmentView,
    PatientDetails, PatientRecord, PatientView, PrescriptionRecord, PrescriptionView,
    ProviderAppointmentView, ProviderDetails, ProviderRecord, ProviderView, RevenueByStatus,
    UserRecord,
};

/// The record store.
///
/// Every method is a single statement against the store except
/// [`begin_registration`](Self::begin_registration), which opens a
/// transaction. Lookups by primary key return `Ok(None)` for absent rows;
/// updates of absent rows return `StorageError::NotFound`. Writes that
/// reference an absent patient, provider or appointment also return
/// `StorageError::NotFound`.
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use clinic_storage::{ClinicStorage, StorageError};
///
/// async fn complete(storage: &dyn ClinicStorage, id: i32) -> Result<(), StorageError> {
///     storage
///         .update_appointment_status(id, AppointmentStatus::Completed)
///         .await
///         .map(|_| ())
/// }
/// ```
#[async_trait]
pub trait ClinicStorage: Send + Sync {
    // ==================== Health ====================

    /// Checks that the store answers.
    async fn ping(&self) -> StorageResult<()>;

    // ==================== Accounts ====================

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>>;

    /// Opens the transaction used to create a user and its profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Transaction` if no transaction can be started.
    async fn begin_registration(&self) -> StorageResult<Box<dyn RegistrationTransaction>>;

    // ==================== Ownership ====================

    /// Owning user of a patient row.
    async fn patient_owner(&self, patient_id: PatientId) -> StorageResult<Option<UserId>>;

    /// Owning user of a provider row.
    async fn provider_owner(&self, provider_id: ProviderId) -> StorageResult<Option<UserId>>;

    /// Provider row owned by a user.
    async fn provider_for_user(&self, user_id: UserId) -> StorageResult<Option<ProviderId>>;

    // ==================== Patients ====================

    async fn list_patients(&self) -> StorageResult<Vec<PatientView>>;

    async fn get_patient(&self, patient_id: PatientId) -> StorageResult<Option<PatientView>>;

    /// Replaces every demographic and insurance field of a patient.
    async fn update_patient(
        &self,
        patient_id: PatientId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord>;

    // ==================== Providers ====================

    async fn list_providers(&self) -> StorageResult<Vec<ProviderView>>;

    async fn get_provider(&self, provider_id: ProviderId) -> StorageResult<Option<ProviderView>>;

    // ==================== Appointments ====================

    /// Creates an appointment in status `Scheduled`.
    async fn create_appointment(&self, input: &NewAppointment) -> StorageResult<AppointmentRecord>;

    /// Appointments of a patient ordered by date, then time.
    async fn list_patient_appointments(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PatientAppointmentView>>;

    /// Appointments of a provider ordered by date, then time.
    async fn list_provider_appointments(
        &self,
        provider_id: ProviderId,
    ) -> StorageResult<Vec<ProviderAppointmentView>>;

    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> StorageResult<AppointmentRecord>;

    // ==================== Medical records ====================

    async fn create_medical_record(&self, input: &NewMedicalRecord) -> StorageResult<MedicalRecord>;

    /// Medical records of a patient, latest appointment first.
    async fn list_patient_medical_records(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<MedicalRecordView>>;

    // ==================== Prescriptions ====================

    /// Creates a prescription written by `provider_id`.
    async fn create_prescription(
        &self,
        provider_id: ProviderId,
        input: &NewPrescription,
    ) -> StorageResult<PrescriptionRecord>;

    /// Prescriptions of a patient, newest first.
    async fn list_patient_prescriptions(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PrescriptionView>>;

    // ==================== Billing ====================

    async fn create_billing(&self, input: &NewBilling) -> StorageResult<BillingRecord>;

    async fn update_billing_status(
        &self,
        billing_id: BillingId,
        update: &BillingStatusUpdate,
    ) -> StorageResult<BillingRecord>;

    /// Billing rows of a patient, newest first.
    async fn list_patient_billing(&self, patient_id: PatientId) -> StorageResult<Vec<BillingView>>;

    // ==================== Reports ====================

    /// Appointment counts per status for appointments dated within `range`.
    async fn appointment_report(
        &self,
        range: &DateRange,
    ) -> StorageResult<Vec<AppointmentStatusCount>>;

    /// Billed totals per status for rows created within `range` (UTC days).
    async fn revenue_report(&self, range: &DateRange) -> StorageResult<Vec<RevenueByStatus>>;
}

/// The transaction behind registration.
///
/// Nothing written through it is visible to other readers before
/// [`commit`](Self::commit). Dropping it without committing discards every
/// write.
#[async_trait]
pub trait RegistrationTransaction: Send {
    /// Inserts a user row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is taken.
    async fn insert_user(&mut self, user: &NewUser) -> StorageResult<UserRecord>;

    /// Inserts the patient profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already has a patient
    /// profile or the email is taken.
    async fn insert_patient(
        &mut self,
        user_id: UserId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord>;

    /// Inserts the provider profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already has a provider
    /// profile or the email is taken.
    async fn insert_provider(
        &mut self,
        user_id: UserId,
        details: &ProviderDetails,
    ) -> StorageResult<ProviderRecord>;

    /// Makes every write visible.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards every write.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
