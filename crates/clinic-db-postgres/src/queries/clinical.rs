//! Medical records and prescriptions.

use clinic_auth::{PatientId, ProviderId};
use clinic_storage::types::{MedicalRecordId, PrescriptionId};
use clinic_storage::{
    AppointmentId, MedicalRecord, MedicalRecordView, NewMedicalRecord, NewPrescription,
    PrescriptionRecord, PrescriptionView, StorageResult,
};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::{Date, OffsetDateTime, Time};

use super::appointments::require_patient_appointment;
use crate::error::map_query_error;

type MedicalRecordRow = (
    MedicalRecordId,
    PatientId,
    AppointmentId,
    String,
    Option<String>,
    Option<String>,
    OffsetDateTime,
);

type MedicalRecordViewRow = (
    MedicalRecordId,
    PatientId,
    AppointmentId,
    String,
    Option<String>,
    Option<String>,
    OffsetDateTime,
    Date,
    Time,
    String,
    String,
    Option<String>,
);

type PrescriptionRow = (
    PrescriptionId,
    PatientId,
    ProviderId,
    AppointmentId,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Date,
);

type PrescriptionViewRow = (
    PrescriptionId,
    PatientId,
    ProviderId,
    AppointmentId,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Date,
    Date,
    String,
    String,
    Option<String>,
);

const RECORD_COLUMNS: &str =
    "m.id, m.patient_id, m.appointment_id, m.diagnosis, m.treatment, m.notes, m.created_at";

const PRESCRIPTION_COLUMNS: &str = "rx.id, rx.patient_id, rx.provider_id, rx.appointment_id, \
     rx.medication_name, rx.dosage, rx.frequency, rx.duration, rx.instructions, rx.prescribed_date";

fn record_from_row(row: MedicalRecordRow) -> MedicalRecord {
    let (id, patient_id, appointment_id, diagnosis, treatment, notes, created_at) = row;
    MedicalRecord {
        id,
        patient_id,
        appointment_id,
        diagnosis,
        treatment,
        notes,
        created_at,
    }
}

fn prescription_from_row(row: PrescriptionRow) -> PrescriptionRecord {
    let (
        id,
        patient_id,
        provider_id,
        appointment_id,
        medication_name,
        dosage,
        frequency,
        duration,
        instructions,
        prescribed_date,
    ) = row;
    PrescriptionRecord {
        id,
        patient_id,
        provider_id,
        appointment_id,
        medication_name,
        dosage,
        frequency,
        duration,
        instructions,
        prescribed_date,
    }
}

pub async fn create_medical_record(
    pool: &PgPool,
    input: &NewMedicalRecord,
) -> StorageResult<MedicalRecord> {
    require_patient_appointment(pool, input.patient_id, input.appointment_id).await?;

    let sql = format!(
        "INSERT INTO medical_records AS m (patient_id, appointment_id, diagnosis, treatment, notes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {RECORD_COLUMNS}"
    );
    let row: MedicalRecordRow = query_as(&sql)
        .bind(input.patient_id)
        .bind(input.appointment_id)
        .bind(&input.diagnosis)
        .bind(input.treatment.as_deref())
        .bind(input.notes.as_deref())
        .fetch_one(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to create medical record"))?;

    Ok(record_from_row(row))
}

/// Latest appointment first.
pub async fn list_medical_records(
    pool: &PgPool,
    patient_id: PatientId,
) -> StorageResult<Vec<MedicalRecordView>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS}, a.appointment_date, a.appointment_time, \
                hp.first_name, hp.last_name, hp.specialization \
         FROM medical_records m \
         JOIN appointments a ON a.id = m.appointment_id \
         JOIN healthcare_providers hp ON hp.id = a.provider_id \
         WHERE m.patient_id = $1 \
         ORDER BY a.appointment_date DESC, a.appointment_time DESC, m.id DESC"
    );
    let rows: Vec<MedicalRecordViewRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list medical records"))?;

    Ok(rows
        .into_iter()
        .map(|(a, b, c, d, e, f, g, date, time, first, last, specialization)| MedicalRecordView {
            record: record_from_row((a, b, c, d, e, f, g)),
            appointment_date: date,
            appointment_time: time,
            provider_first_name: first,
            provider_last_name: last,
            provider_specialization: specialization,
        })
        .collect())
}

pub async fn create_prescription(
    pool: &PgPool,
    provider_id: ProviderId,
    input: &NewPrescription,
) -> StorageResult<PrescriptionRecord> {
    require_patient_appointment(pool, input.patient_id, input.appointment_id).await?;

    let sql = format!(
        "INSERT INTO prescriptions AS rx \
           (patient_id, provider_id, appointment_id, medication_name, dosage, frequency, \
            duration, instructions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PRESCRIPTION_COLUMNS}"
    );
    let row: PrescriptionRow = query_as(&sql)
        .bind(input.patient_id)
        .bind(provider_id)
        .bind(input.appointment_id)
        .bind(&input.medication_name)
        .bind(&input.dosage)
        .bind(&input.frequency)
        .bind(input.duration.as_deref())
        .bind(input.instructions.as_deref())
        .fetch_one(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to create prescription"))?;

    Ok(prescription_from_row(row))
}

/// Newest first.
pub async fn list_prescriptions(
    pool: &PgPool,
    patient_id: PatientId,
) -> StorageResult<Vec<PrescriptionView>> {
    let sql = format!(
        "SELECT {PRESCRIPTION_COLUMNS}, a.appointment_date, \
                hp.first_name, hp.last_name, hp.specialization \
         FROM prescriptions rx \
         JOIN appointments a ON a.id = rx.appointment_id \
         JOIN healthcare_providers hp ON hp.id = rx.provider_id \
         WHERE rx.patient_id = $1 \
         ORDER BY rx.prescribed_date DESC, rx.id DESC"
    );
    let rows: Vec<PrescriptionViewRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list prescriptions"))?;

    Ok(rows
        .into_iter()
        .map(|(a, b, c, d, e, f, g, h, i, j, date, first, last, specialization)| PrescriptionView {
            prescription: prescription_from_row((a, b, c, d, e, f, g, h, i, j)),
            appointment_date: date,
            provider_first_name: first,
            provider_last_name: last,
            provider_specialization: specialization,
        })
        .collect())
}
