//! Table contents and constraint checks shared by the store and its
//! transactions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use clinic_auth::{PatientId, ProviderId, UserId};
use clinic_storage::types::{MedicalRecordId, PrescriptionId};
use clinic_storage::{
    AppointmentId, AppointmentRecord, BillingId, BillingRecord, MedicalRecord, PatientRecord,
    PrescriptionRecord, ProviderRecord, StorageError, StorageResult, UserRecord,
};

/// Monotonic id sequences. Like SERIAL columns, ids handed out by a
/// discarded transaction are never reused.
#[derive(Debug)]
pub(crate) struct Sequences {
    users: AtomicI32,
    patients: AtomicI32,
    providers: AtomicI32,
    appointments: AtomicI32,
    medical_records: AtomicI32,
    prescriptions: AtomicI32,
    billing: AtomicI32,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            users: AtomicI32::new(1),
            patients: AtomicI32::new(1),
            providers: AtomicI32::new(1),
            appointments: AtomicI32::new(1),
            medical_records: AtomicI32::new(1),
            prescriptions: AtomicI32::new(1),
            billing: AtomicI32::new(1),
        }
    }
}

fn next(seq: &AtomicI32) -> i32 {
    seq.fetch_add(1, Ordering::Relaxed)
}

impl Sequences {
    pub(crate) fn next_user(&self) -> UserId {
        next(&self.users)
    }

    pub(crate) fn next_patient(&self) -> PatientId {
        next(&self.patients)
    }

    pub(crate) fn next_provider(&self) -> ProviderId {
        next(&self.providers)
    }

    pub(crate) fn next_appointment(&self) -> AppointmentId {
        next(&self.appointments)
    }

    pub(crate) fn next_medical_record(&self) -> MedicalRecordId {
        next(&self.medical_records)
    }

    pub(crate) fn next_prescription(&self) -> PrescriptionId {
        next(&self.prescriptions)
    }

    pub(crate) fn next_billing(&self) -> BillingId {
        next(&self.billing)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub users: BTreeMap<UserId, UserRecord>,
    pub patients: BTreeMap<PatientId, PatientRecord>,
    pub providers: BTreeMap<ProviderId, ProviderRecord>,
    pub appointments: BTreeMap<AppointmentId, AppointmentRecord>,
    pub medical_records: BTreeMap<MedicalRecordId, MedicalRecord>,
    pub prescriptions: BTreeMap<PrescriptionId, PrescriptionRecord>,
    pub billing: BTreeMap<BillingId, BillingRecord>,
}

impl Tables {
    pub fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|u| u.username == username)
    }

    pub fn check_username(&self, username: &str) -> StorageResult<()> {
        if self.username_taken(username) {
            return Err(StorageError::conflict("Username already exists"));
        }
        Ok(())
    }

    /// Enforces `patients.user_id` and `patients.email` uniqueness.
    /// `except` is the row being updated.
    pub fn check_patient(
        &self,
        user_id: Option<UserId>,
        email: Option<&str>,
        except: Option<PatientId>,
    ) -> StorageResult<()> {
        for patient in self.patients.values().filter(|p| Some(p.id) != except) {
            if Some(patient.user_id) == user_id {
                return Err(StorageError::conflict("User already has a patient profile"));
            }
            if email.is_some() && patient.details.email.as_deref() == email {
                return Err(StorageError::conflict("Email already registered"));
            }
        }
        Ok(())
    }

    /// Enforces `healthcare_providers.user_id` and `.email` uniqueness.
    pub fn check_provider(&self, user_id: UserId, email: Option<&str>) -> StorageResult<()> {
        for provider in self.providers.values() {
            if provider.user_id == user_id {
                return Err(StorageError::conflict("User already has a provider profile"));
            }
            if email.is_some() && provider.details.email.as_deref() == email {
                return Err(StorageError::conflict("Email already registered"));
            }
        }
        Ok(())
    }

    pub fn require_patient(&self, patient_id: PatientId) -> StorageResult<&PatientRecord> {
        self.patients.get(&patient_id).ok_or_else(|| {
            StorageError::missing_reference(format!("Patient {patient_id} does not exist"))
        })
    }

    pub fn require_provider(&self, provider_id: ProviderId) -> StorageResult<&ProviderRecord> {
        self.providers.get(&provider_id).ok_or_else(|| {
            StorageError::missing_reference(format!("Provider {provider_id} does not exist"))
        })
    }

    pub fn require_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> StorageResult<&AppointmentRecord> {
        self.appointments.get(&appointment_id).ok_or_else(|| {
            StorageError::missing_reference(format!("Appointment {appointment_id} does not exist"))
        })
    }

    /// Clinical and billing rows hang off an appointment of the same patient.
    pub fn require_patient_appointment(
        &self,
        patient_id: PatientId,
        appointment_id: AppointmentId,
    ) -> StorageResult<&AppointmentRecord> {
        let appointment = self.require_appointment(appointment_id)?;
        if appointment.patient_id != patient_id {
            return Err(StorageError::invalid_input(format!(
                "Appointment {appointment_id} does not belong to patient {patient_id}"
            )));
        }
        Ok(appointment)
    }
}
