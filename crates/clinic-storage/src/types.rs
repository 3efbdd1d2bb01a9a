//! Row, view and input types of the record store.
//!
//! Rows serialize with the column names of the relational schema. Views
//! flatten a row and add the joined display fields.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use clinic_auth::{PatientId, ProviderId, Role, UserId};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::error::StorageError;
use crate::StorageResult;

/// Primary key of a row in `appointments`.
pub type AppointmentId = i32;

/// Primary key of a row in `billing`.
pub type BillingId = i32;

/// Primary key of a row in `medical_records`.
pub type MedicalRecordId = i32;

/// Primary key of a row in `prescriptions`.
pub type PrescriptionId = i32;

/// Serde adapter for wall-clock appointment times.
///
/// Serializes as `HH:MM:SS` and accepts `HH:MM` or `HH:MM:SS`.
pub mod clock_time {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::Time;
    use time::format_description::BorrowedFormatItem;
    use time::macros::format_description;

    const WITH_SECONDS: &[BorrowedFormatItem<'static>] =
        format_description!("[hour]:[minute]:[second]");
    const WITHOUT_SECONDS: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

    /// Parses `HH:MM` or `HH:MM:SS`.
    pub fn parse(value: &str) -> Result<Time, time::error::Parse> {
        Time::parse(value, WITH_SECONDS).or_else(|_| Time::parse(value, WITHOUT_SECONDS))
    }

    pub fn serialize<S: Serializer>(value: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value.format(WITH_SECONDS).map_err(ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse(&value).map_err(de::Error::custom)
    }
}

fn require(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::invalid_input(format!("{field} is required")));
    }
    Ok(())
}

/// Column width limits, counted in characters like `VARCHAR(n)`.
fn max_len(field: &str, value: &str, max: usize) -> StorageResult<()> {
    if value.chars().count() > max {
        return Err(StorageError::invalid_input(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn max_len_opt(field: &str, value: Option<&str>, max: usize) -> StorageResult<()> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}

/// Required, and at most `max` characters.
fn require_len(field: &str, value: &str, max: usize) -> StorageResult<()> {
    require(field, value)?;
    max_len(field, value, max)
}

const NAME_LEN: usize = 100;
const PHONE_LEN: usize = 30;
const EMAIL_LEN: usize = 255;
const GENDER_LEN: usize = 20;
const MEDICATION_LEN: usize = 200;
const BILLING_STATUS_LEN: usize = 50;

/// Billed amounts are `NUMERIC(10, 2)`: eight integer digits.
fn check_amount(amount: &BigDecimal) -> StorageResult<()> {
    if *amount < BigDecimal::zero() {
        return Err(StorageError::invalid_input("amount must not be negative"));
    }
    if amount.round(2) >= BigDecimal::from(100_000_000) {
        return Err(StorageError::invalid_input(
            "amount must be less than 100000000",
        ));
    }
    Ok(())
}

// ============================================================================
// Users
// ============================================================================

/// A row of `users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Input for a new user row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// ============================================================================
// Patients and providers
// ============================================================================

/// Demographic and insurance fields of a patient.
///
/// Used for both the registration profile and the patient update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub insurance_provider: Option<String>,
    #[serde(default)]
    pub insurance_number: Option<String>,
}

impl PatientDetails {
    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` naming the first missing or
    /// over-long field.
    pub fn validate(&self) -> StorageResult<()> {
        require_len("first_name", &self.first_name, NAME_LEN)?;
        require_len("last_name", &self.last_name, NAME_LEN)?;
        max_len_opt("gender", self.gender.as_deref(), GENDER_LEN)?;
        max_len_opt("phone", self.phone.as_deref(), PHONE_LEN)?;
        max_len_opt("email", self.email.as_deref(), EMAIL_LEN)?;
        max_len_opt("insurance_provider", self.insurance_provider.as_deref(), NAME_LEN)?;
        max_len_opt("insurance_number", self.insurance_number.as_deref(), NAME_LEN)
    }
}

/// A row of `patients`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: PatientDetails,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A patient row joined with its owner's username.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: PatientRecord,
    pub username: String,
}

/// Profile fields of a doctor or nurse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDetails {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl ProviderDetails {
    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` naming the first missing or
    /// over-long field.
    pub fn validate(&self) -> StorageResult<()> {
        require_len("first_name", &self.first_name, NAME_LEN)?;
        require_len("last_name", &self.last_name, NAME_LEN)?;
        max_len_opt("specialization", self.specialization.as_deref(), NAME_LEN)?;
        max_len_opt("phone", self.phone.as_deref(), PHONE_LEN)?;
        max_len_opt("email", self.email.as_deref(), EMAIL_LEN)?;
        max_len_opt("department", self.department.as_deref(), NAME_LEN)
    }
}

/// A row of `healthcare_providers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: ProviderDetails,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A provider row joined with its owner's username.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderView {
    #[serde(flatten)]
    pub provider: ProviderRecord,
    pub username: String,
}

// ============================================================================
// Appointments
// ============================================================================

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    #[serde(rename = "No-Show")]
    NoShow,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No-Show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(Self::Scheduled),
            "Confirmed" => Ok(Self::Confirmed),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "No-Show" => Ok(Self::NoShow),
            other => Err(StorageError::invalid_input(format!(
                "Unknown appointment status: {other}"
            ))),
        }
    }
}

/// Input for a new appointment. Status is always `Scheduled`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAppointment {
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub appointment_date: Date,
    #[serde(with = "clock_time")]
    pub appointment_time: Time,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A row of `appointments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub appointment_date: Date,
    #[serde(with = "clock_time")]
    pub appointment_time: Time,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// An appointment as listed for a patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientAppointmentView {
    #[serde(flatten)]
    pub appointment: AppointmentRecord,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub provider_first_name: String,
    pub provider_last_name: String,
    pub provider_specialization: Option<String>,
}

/// An appointment as listed for a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAppointmentView {
    #[serde(flatten)]
    pub appointment: AppointmentRecord,
    pub patient_first_name: String,
    pub patient_last_name: String,
}

// ============================================================================
// Medical records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMedicalRecord {
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewMedicalRecord {
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` when the diagnosis is blank.
    pub fn validate(&self) -> StorageResult<()> {
        require("diagnosis", &self.diagnosis)
    }
}

/// A row of `medical_records`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A medical record with its appointment slot and treating provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalRecordView {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub appointment_date: Date,
    #[serde(with = "clock_time")]
    pub appointment_time: Time,
    pub provider_first_name: String,
    pub provider_last_name: String,
    pub provider_specialization: Option<String>,
}

// ============================================================================
// Prescriptions
// ============================================================================

/// Client payload for a prescription.
///
/// Carries no provider id: the prescribing provider is the acting principal,
/// and any `provider_id` in the body is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPrescription {
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl NewPrescription {
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` naming the first blank or
    /// over-long field.
    pub fn validate(&self) -> StorageResult<()> {
        require_len("medication_name", &self.medication_name, MEDICATION_LEN)?;
        require_len("dosage", &self.dosage, NAME_LEN)?;
        require_len("frequency", &self.frequency, NAME_LEN)?;
        max_len_opt("duration", self.duration.as_deref(), NAME_LEN)
    }
}

/// A row of `prescriptions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionRecord {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub appointment_id: AppointmentId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    pub prescribed_date: Date,
}

/// A prescription with its appointment date and prescribing provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: PrescriptionRecord,
    pub appointment_date: Date,
    pub provider_first_name: String,
    pub provider_last_name: String,
    pub provider_specialization: Option<String>,
}

// ============================================================================
// Billing
// ============================================================================

fn default_billing_status() -> String {
    "Pending".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBilling {
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    pub amount: BigDecimal,
    #[serde(default = "default_billing_status")]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub insurance_claim_details: Option<String>,
}

impl NewBilling {
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an amount outside
    /// `0..10^8`, a blank status or an over-long field.
    pub fn validate(&self) -> StorageResult<()> {
        check_amount(&self.amount)?;
        require_len("status", &self.status, BILLING_STATUS_LEN)?;
        max_len_opt(
            "payment_method",
            self.payment_method.as_deref(),
            BILLING_STATUS_LEN,
        )
    }
}

/// Sets status, payment method and payment date of a billing row together.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BillingStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_date: Option<Date>,
}

impl BillingStatusUpdate {
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` when the status is blank or a
    /// field is over-long.
    pub fn validate(&self) -> StorageResult<()> {
        require_len("status", &self.status, BILLING_STATUS_LEN)?;
        max_len_opt(
            "payment_method",
            self.payment_method.as_deref(),
            BILLING_STATUS_LEN,
        )
    }
}

/// A row of `billing`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingRecord {
    pub id: BillingId,
    pub patient_id: PatientId,
    pub appointment_id: AppointmentId,
    pub amount: BigDecimal,
    pub status: String,
    pub payment_method: Option<String>,
    pub insurance_claim_details: Option<String>,
    pub payment_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A billing row with its appointment date and patient names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingView {
    #[serde(flatten)]
    pub billing: BillingRecord,
    pub appointment_date: Date,
    pub patient_first_name: String,
    pub patient_last_name: String,
}

// ============================================================================
// Reports
// ============================================================================

/// Inclusive calendar date range of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` when `start` is after `end`.
    pub fn new(start: Date, end: Date) -> StorageResult<Self> {
        if start > end {
            return Err(StorageError::invalid_input(
                "start_date must not be after end_date",
            ));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> Date {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Date {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentStatusCount {
    pub status: AppointmentStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueByStatus {
    pub status: String,
    pub total_amount: BigDecimal,
    pub count: i64,
}
