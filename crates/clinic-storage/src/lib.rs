//! # clinic-storage
//!
//! Record store abstraction for the clinic server.
//!
//! This crate defines the traits and types every storage backend implements.
//! It contains no implementation; those live in `clinic-db-memory` and
//! `clinic-db-postgres`.
//!
//! ## Overview
//!
//! [`ClinicStorage`] has one method per store operation of the HTTP surface.
//! Multi-table writes go through a [`RegistrationTransaction`], which makes a
//! user row and its patient or provider profile visible together or not at
//! all.
//!
//! ## Example
//!
//! ```ignore
//! use clinic_storage::{ClinicStorage, StorageError, PatientView};
//!
//! async fn load_patient(
//!     storage: &dyn ClinicStorage,
//!     id: i32,
//! ) -> Result<PatientView, StorageError> {
//!     storage
//!         .get_patient(id)
//!         .await?
//!         .ok_or_else(|| StorageError::not_found("Patient", id))
//! }
//! ```

mod error;
mod ownership;
mod traits;
pub mod types;

pub use error::StorageError;
pub use ownership::StorageOwnership;
pub use traits::{ClinicStorage, RegistrationTransaction};
pub use types::{
    AppointmentId, AppointmentRecord, AppointmentStatus, AppointmentStatusCount, BillingId,
    BillingRecord, BillingStatusUpdate, BillingView, DateRange, MedicalRecord, MedicalRecordView,
    NewAppointment, NewBilling, NewMedicalRecord, NewPrescription, NewUser, PatientAppointmentView,
    PatientDetails, PatientRecord, PatientView, PrescriptionRecord, PrescriptionView,
    ProviderAppointmentView, ProviderDetails, ProviderRecord, ProviderView, RevenueByStatus,
    UserRecord, clock_time,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn ClinicStorage>;
