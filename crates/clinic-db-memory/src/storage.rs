//! In-memory `ClinicStorage` implementation.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use clinic_auth::{PatientId, ProviderId, UserId};
use clinic_storage::{
    AppointmentId, AppointmentRecord, AppointmentStatus, AppointmentStatusCount, BillingId,
    BillingRecord, BillingStatusUpdate, BillingView, ClinicStorage, DateRange, MedicalRecord,
    MedicalRecordView, NewAppointment, NewBilling, NewMedicalRecord, NewPrescription,
    PatientAppointmentView, PatientDetails, PatientRecord, PatientView, PrescriptionRecord,
    PrescriptionView, ProviderAppointmentView, ProviderView, RegistrationTransaction,
    RevenueByStatus, StorageError, StorageResult, UserRecord,
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::tables::{Sequences, Tables};
use crate::transaction::InMemoryRegistration;

/// In-memory record store.
///
/// All tables sit behind one `tokio::sync::RwLock`; every operation takes
/// the lock once, which gives each operation the isolation of a single SQL
/// statement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
    sequences: Arc<Sequences>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed user rows.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl ClinicStorage for InMemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    // ==================== Accounts ====================

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn begin_registration(&self) -> StorageResult<Box<dyn RegistrationTransaction>> {
        Ok(Box::new(InMemoryRegistration::new(
            self.tables.clone(),
            self.sequences.clone(),
        )))
    }

    // ==================== Ownership ====================

    async fn patient_owner(&self, patient_id: PatientId) -> StorageResult<Option<UserId>> {
        let tables = self.tables.read().await;
        Ok(tables.patients.get(&patient_id).map(|p| p.user_id))
    }

    async fn provider_owner(&self, provider_id: ProviderId) -> StorageResult<Option<UserId>> {
        let tables = self.tables.read().await;
        Ok(tables.providers.get(&provider_id).map(|p| p.user_id))
    }

    async fn provider_for_user(&self, user_id: UserId) -> StorageResult<Option<ProviderId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .values()
            .find(|p| p.user_id == user_id)
            .map(|p| p.id))
    }

    // ==================== Patients ====================

    async fn list_patients(&self) -> StorageResult<Vec<PatientView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .values()
            .filter_map(|p| patient_view(&tables, p))
            .collect())
    }

    async fn get_patient(&self, patient_id: PatientId) -> StorageResult<Option<PatientView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .get(&patient_id)
            .and_then(|p| patient_view(&tables, p)))
    }

    async fn update_patient(
        &self,
        patient_id: PatientId,
        details: &PatientDetails,
    ) -> StorageResult<PatientRecord> {
        let mut tables = self.tables.write().await;
        if !tables.patients.contains_key(&patient_id) {
            return Err(StorageError::not_found("Patient", patient_id));
        }
        tables.check_patient(None, details.email.as_deref(), Some(patient_id))?;

        let patient = tables
            .patients
            .get_mut(&patient_id)
            .ok_or_else(|| StorageError::not_found("Patient", patient_id))?;
        patient.details = details.clone();
        Ok(patient.clone())
    }

    // ==================== Providers ====================

    async fn list_providers(&self) -> StorageResult<Vec<ProviderView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .values()
            .filter_map(|p| {
                let user = tables.users.get(&p.user_id)?;
                Some(ProviderView {
                    provider: p.clone(),
                    username: user.username.clone(),
                })
            })
            .collect())
    }

    async fn get_provider(&self, provider_id: ProviderId) -> StorageResult<Option<ProviderView>> {
        let tables = self.tables.read().await;
        Ok(tables.providers.get(&provider_id).and_then(|p| {
            let user = tables.users.get(&p.user_id)?;
            Some(ProviderView {
                provider: p.clone(),
                username: user.username.clone(),
            })
        }))
    }

    // ==================== Appointments ====================

    async fn create_appointment(&self, input: &NewAppointment) -> StorageResult<AppointmentRecord> {
        let mut tables = self.tables.write().await;
        tables.require_patient(input.patient_id)?;
        tables.require_provider(input.provider_id)?;

        let record = AppointmentRecord {
            id: self.sequences.next_appointment(),
            patient_id: input.patient_id,
            provider_id: input.provider_id,
            appointment_date: input.appointment_date,
            appointment_time: input.appointment_time,
            reason: input.reason.clone(),
            status: AppointmentStatus::Scheduled,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.appointments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PatientAppointmentView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .filter_map(|a| {
                let patient = tables.patients.get(&a.patient_id)?;
                let provider = tables.providers.get(&a.provider_id)?;
                Some(PatientAppointmentView {
                    appointment: a.clone(),
                    patient_first_name: patient.details.first_name.clone(),
                    patient_last_name: patient.details.last_name.clone(),
                    provider_first_name: provider.details.first_name.clone(),
                    provider_last_name: provider.details.last_name.clone(),
                    provider_specialization: provider.details.specialization.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| chronological(&r.appointment));
        Ok(rows)
    }

    async fn list_provider_appointments(
        &self,
        provider_id: ProviderId,
    ) -> StorageResult<Vec<ProviderAppointmentView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| a.provider_id == provider_id)
            .filter_map(|a| {
                let patient = tables.patients.get(&a.patient_id)?;
                Some(ProviderAppointmentView {
                    appointment: a.clone(),
                    patient_first_name: patient.details.first_name.clone(),
                    patient_last_name: patient.details.last_name.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| chronological(&r.appointment));
        Ok(rows)
    }

    async fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> StorageResult<AppointmentRecord> {
        let mut tables = self.tables.write().await;
        let appointment = tables
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StorageError::not_found("Appointment", appointment_id))?;
        appointment.status = status;
        Ok(appointment.clone())
    }

    // ==================== Medical records ====================

    async fn create_medical_record(&self, input: &NewMedicalRecord) -> StorageResult<MedicalRecord> {
        let mut tables = self.tables.write().await;
        tables.require_patient(input.patient_id)?;
        tables.require_patient_appointment(input.patient_id, input.appointment_id)?;

        let record = MedicalRecord {
            id: self.sequences.next_medical_record(),
            patient_id: input.patient_id,
            appointment_id: input.appointment_id,
            diagnosis: input.diagnosis.clone(),
            treatment: input.treatment.clone(),
            notes: input.notes.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.medical_records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_patient_medical_records(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<MedicalRecordView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .medical_records
            .values()
            .filter(|r| r.patient_id == patient_id)
            .filter_map(|r| {
                let appointment = tables.appointments.get(&r.appointment_id)?;
                let provider = tables.providers.get(&appointment.provider_id)?;
                Some(MedicalRecordView {
                    record: r.clone(),
                    appointment_date: appointment.appointment_date,
                    appointment_time: appointment.appointment_time,
                    provider_first_name: provider.details.first_name.clone(),
                    provider_last_name: provider.details.last_name.clone(),
                    provider_specialization: provider.details.specialization.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| Reverse((r.appointment_date, r.appointment_time, r.record.id)));
        Ok(rows)
    }

    // ==================== Prescriptions ====================

    async fn create_prescription(
        &self,
        provider_id: ProviderId,
        input: &NewPrescription,
    ) -> StorageResult<PrescriptionRecord> {
        let mut tables = self.tables.write().await;
        tables.require_patient(input.patient_id)?;
        tables.require_provider(provider_id)?;
        tables.require_patient_appointment(input.patient_id, input.appointment_id)?;

        let record = PrescriptionRecord {
            id: self.sequences.next_prescription(),
            patient_id: input.patient_id,
            provider_id,
            appointment_id: input.appointment_id,
            medication_name: input.medication_name.clone(),
            dosage: input.dosage.clone(),
            frequency: input.frequency.clone(),
            duration: input.duration.clone(),
            instructions: input.instructions.clone(),
            prescribed_date: OffsetDateTime::now_utc().date(),
        };
        tables.prescriptions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_patient_prescriptions(
        &self,
        patient_id: PatientId,
    ) -> StorageResult<Vec<PrescriptionView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .prescriptions
            .values()
            .filter(|p| p.patient_id == patient_id)
            .filter_map(|p| {
                let appointment = tables.appointments.get(&p.appointment_id)?;
                let provider = tables.providers.get(&p.provider_id)?;
                Some(PrescriptionView {
                    prescription: p.clone(),
                    appointment_date: appointment.appointment_date,
                    provider_first_name: provider.details.first_name.clone(),
                    provider_last_name: provider.details.last_name.clone(),
                    provider_specialization: provider.details.specialization.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| Reverse((r.prescription.prescribed_date, r.prescription.id)));
        Ok(rows)
    }

    // ==================== Billing ====================

    async fn create_billing(&self, input: &NewBilling) -> StorageResult<BillingRecord> {
        let mut tables = self.tables.write().await;
        tables.require_patient(input.patient_id)?;
        tables.require_patient_appointment(input.patient_id, input.appointment_id)?;

        let record = BillingRecord {
            id: self.sequences.next_billing(),
            patient_id: input.patient_id,
            appointment_id: input.appointment_id,
            amount: input.amount.clone(),
            status: input.status.clone(),
            payment_method: input.payment_method.clone(),
            insurance_claim_details: input.insurance_claim_details.clone(),
            payment_date: None,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.billing.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_billing_status(
        &self,
        billing_id: BillingId,
        update: &BillingStatusUpdate,
    ) -> StorageResult<BillingRecord> {
        let mut tables = self.tables.write().await;
        let billing = tables
            .billing
            .get_mut(&billing_id)
            .ok_or_else(|| StorageError::not_found("Billing record", billing_id))?;
        billing.status = update.status.clone();
        billing.payment_method = update.payment_method.clone();
        billing.payment_date = update.payment_date;
        Ok(billing.clone())
    }

    async fn list_patient_billing(&self, patient_id: PatientId) -> StorageResult<Vec<BillingView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .billing
            .values()
            .filter(|b| b.patient_id == patient_id)
            .filter_map(|b| {
                let appointment = tables.appointments.get(&b.appointment_id)?;
                let patient = tables.patients.get(&b.patient_id)?;
                Some(BillingView {
                    billing: b.clone(),
                    appointment_date: appointment.appointment_date,
                    patient_first_name: patient.details.first_name.clone(),
                    patient_last_name: patient.details.last_name.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| Reverse((r.billing.created_at, r.billing.id)));
        Ok(rows)
    }

    // ==================== Reports ====================

    async fn appointment_report(
        &self,
        range: &DateRange,
    ) -> StorageResult<Vec<AppointmentStatusCount>> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<&'static str, (AppointmentStatus, i64)> = BTreeMap::new();
        for appointment in tables
            .appointments
            .values()
            .filter(|a| range.contains(a.appointment_date))
        {
            counts
                .entry(appointment.status.as_str())
                .or_insert((appointment.status, 0))
                .1 += 1;
        }
        Ok(counts
            .into_values()
            .map(|(status, count)| AppointmentStatusCount { status, count })
            .collect())
    }

    async fn revenue_report(&self, range: &DateRange) -> StorageResult<Vec<RevenueByStatus>> {
        let tables = self.tables.read().await;
        let mut totals: BTreeMap<String, (BigDecimal, i64)> = BTreeMap::new();
        for billing in tables
            .billing
            .values()
            .filter(|b| range.contains(b.created_at.date()))
        {
            let entry = totals
                .entry(billing.status.clone())
                .or_insert_with(|| (BigDecimal::from(0), 0));
            entry.0 += &billing.amount;
            entry.1 += 1;
        }
        Ok(totals
            .into_iter()
            .map(|(status, (total_amount, count))| RevenueByStatus {
                status,
                total_amount,
                count,
            })
            .collect())
    }
}

fn patient_view(tables: &Tables, patient: &PatientRecord) -> Option<PatientView> {
    let user = tables.users.get(&patient.user_id)?;
    Some(PatientView {
        patient: patient.clone(),
        username: user.username.clone(),
    })
}

fn chronological(appointment: &AppointmentRecord) -> (time::Date, time::Time, AppointmentId) {
    (
        appointment.appointment_date,
        appointment.appointment_time,
        appointment.id,
    )
}
