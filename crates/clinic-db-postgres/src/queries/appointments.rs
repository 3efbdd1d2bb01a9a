//! Appointments.

use clinic_auth::{PatientId, ProviderId};
use clinic_storage::{
    AppointmentId, AppointmentRecord, AppointmentStatus, NewAppointment, PatientAppointmentView,
    ProviderAppointmentView, StorageError, StorageResult,
};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::{Date, OffsetDateTime, Time};

use super::parse_status;
use crate::error::map_query_error;

type AppointmentRow = (
    AppointmentId,
    PatientId,
    ProviderId,
    Date,
    Time,
    Option<String>,
    String,
    OffsetDateTime,
);

type PatientAppointmentRow = (
    AppointmentId,
    PatientId,
    ProviderId,
    Date,
    Time,
    Option<String>,
    String,
    OffsetDateTime,
    String,
    String,
    String,
    String,
    Option<String>,
);

type ProviderAppointmentRow = (
    AppointmentId,
    PatientId,
    ProviderId,
    Date,
    Time,
    Option<String>,
    String,
    OffsetDateTime,
    String,
    String,
);

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.provider_id, a.appointment_date, \
     a.appointment_time, a.reason, a.status, a.created_at";

fn appointment_from_row(row: AppointmentRow) -> StorageResult<AppointmentRecord> {
    let (id, patient_id, provider_id, appointment_date, appointment_time, reason, status, created_at) =
        row;
    Ok(AppointmentRecord {
        id,
        patient_id,
        provider_id,
        appointment_date,
        appointment_time,
        reason,
        status: parse_status(&status)?,
        created_at,
    })
}

pub async fn create_appointment(
    pool: &PgPool,
    input: &NewAppointment,
) -> StorageResult<AppointmentRecord> {
    let sql = format!(
        "INSERT INTO appointments AS a \
           (patient_id, provider_id, appointment_date, appointment_time, reason, status) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {APPOINTMENT_COLUMNS}"
    );
    let row: AppointmentRow = query_as(&sql)
        .bind(input.patient_id)
        .bind(input.provider_id)
        .bind(input.appointment_date)
        .bind(input.appointment_time)
        .bind(input.reason.as_deref())
        .bind(AppointmentStatus::Scheduled.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to create appointment"))?;

    appointment_from_row(row)
}

pub async fn list_for_patient(
    pool: &PgPool,
    patient_id: PatientId,
) -> StorageResult<Vec<PatientAppointmentView>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, p.first_name, p.last_name, \
                hp.first_name, hp.last_name, hp.specialization \
         FROM appointments a \
         JOIN patients p ON p.id = a.patient_id \
         JOIN healthcare_providers hp ON hp.id = a.provider_id \
         WHERE a.patient_id = $1 \
         ORDER BY a.appointment_date, a.appointment_time, a.id"
    );
    let rows: Vec<PatientAppointmentRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list patient appointments"))?;

    rows.into_iter()
        .map(|(a, b, c, d, e, f, g, h, pf, pl, df, dl, specialization)| {
            Ok(PatientAppointmentView {
                appointment: appointment_from_row((a, b, c, d, e, f, g, h))?,
                patient_first_name: pf,
                patient_last_name: pl,
                provider_first_name: df,
                provider_last_name: dl,
                provider_specialization: specialization,
            })
        })
        .collect()
}

pub async fn list_for_provider(
    pool: &PgPool,
    provider_id: ProviderId,
) -> StorageResult<Vec<ProviderAppointmentView>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS}, p.first_name, p.last_name \
         FROM appointments a \
         JOIN patients p ON p.id = a.patient_id \
         WHERE a.provider_id = $1 \
         ORDER BY a.appointment_date, a.appointment_time, a.id"
    );
    let rows: Vec<ProviderAppointmentRow> = query_as(&sql)
        .bind(provider_id)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list provider appointments"))?;

    rows.into_iter()
        .map(|(a, b, c, d, e, f, g, h, pf, pl)| {
            Ok(ProviderAppointmentView {
                appointment: appointment_from_row((a, b, c, d, e, f, g, h))?,
                patient_first_name: pf,
                patient_last_name: pl,
            })
        })
        .collect()
}

pub async fn update_status(
    pool: &PgPool,
    appointment_id: AppointmentId,
    status: AppointmentStatus,
) -> StorageResult<AppointmentRecord> {
    let sql = format!(
        "UPDATE appointments a SET status = $2 WHERE a.id = $1 RETURNING {APPOINTMENT_COLUMNS}"
    );
    let row: Option<AppointmentRow> = query_as(&sql)
        .bind(appointment_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to update appointment"))?;

    row.ok_or_else(|| StorageError::not_found("Appointment", appointment_id))
        .and_then(appointment_from_row)
}

/// Fails unless `appointment_id` exists and was booked for `patient_id`.
///
/// `appointments.patient_id` is never updated, so the answer cannot change
/// between this check and the insert that follows it.
pub async fn require_patient_appointment(
    pool: &PgPool,
    patient_id: PatientId,
    appointment_id: AppointmentId,
) -> StorageResult<()> {
    let (patient_exists, owner): (bool, Option<PatientId>) = query_as(
        "SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1), \
                (SELECT a.patient_id FROM appointments a WHERE a.id = $2)",
    )
    .bind(patient_id)
    .bind(appointment_id)
    .fetch_one(pool)
    .await
    .map_err(|e| map_query_error(e, "Failed to look up appointment"))?;

    if !patient_exists {
        return Err(StorageError::missing_reference(format!(
            "Patient {patient_id} does not exist"
        )));
    }
    match owner {
        None => Err(StorageError::missing_reference(format!(
            "Appointment {appointment_id} does not exist"
        ))),
        Some(owner) if owner != patient_id => Err(StorageError::invalid_input(format!(
            "Appointment {appointment_id} does not belong to patient {patient_id}"
        ))),
        Some(_) => Ok(()),
    }
}
