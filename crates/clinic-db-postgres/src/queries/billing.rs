//! Billing rows.

use bigdecimal::BigDecimal;
use clinic_auth::PatientId;
use clinic_storage::{
    AppointmentId, BillingId, BillingRecord, BillingStatusUpdate, BillingView, NewBilling,
    StorageError, StorageResult,
};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::{Date, OffsetDateTime};

use super::appointments::require_patient_appointment;
use crate::error::map_query_error;

type BillingRow = (
    BillingId,
    PatientId,
    AppointmentId,
    BigDecimal,
    String,
    Option<String>,
    Option<String>,
    Option<Date>,
    OffsetDateTime,
);

type BillingViewRow = (
    BillingId,
    PatientId,
    AppointmentId,
    BigDecimal,
    String,
    Option<String>,
    Option<String>,
    Option<Date>,
    OffsetDateTime,
    Date,
    String,
    String,
);

const BILLING_COLUMNS: &str = "b.id, b.patient_id, b.appointment_id, b.amount, b.status, \
     b.payment_method, b.insurance_claim_details, b.payment_date, b.created_at";

fn billing_from_row(row: BillingRow) -> BillingRecord {
    let (
        id,
        patient_id,
        appointment_id,
        amount,
        status,
        payment_method,
        insurance_claim_details,
        payment_date,
        created_at,
    ) = row;
    BillingRecord {
        id,
        patient_id,
        appointment_id,
        amount,
        status,
        payment_method,
        insurance_claim_details,
        payment_date,
        created_at,
    }
}

pub async fn create_billing(pool: &PgPool, input: &NewBilling) -> StorageResult<BillingRecord> {
    require_patient_appointment(pool, input.patient_id, input.appointment_id).await?;

    let sql = format!(
        "INSERT INTO billing AS b \
           (patient_id, appointment_id, amount, status, payment_method, insurance_claim_details) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BILLING_COLUMNS}"
    );
    let row: BillingRow = query_as(&sql)
        .bind(input.patient_id)
        .bind(input.appointment_id)
        .bind(&input.amount)
        .bind(&input.status)
        .bind(input.payment_method.as_deref())
        .bind(input.insurance_claim_details.as_deref())
        .fetch_one(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to create billing record"))?;

    Ok(billing_from_row(row))
}

pub async fn update_status(
    pool: &PgPool,
    billing_id: BillingId,
    update: &BillingStatusUpdate,
) -> StorageResult<BillingRecord> {
    let sql = format!(
        "UPDATE billing b SET status = $2, payment_method = $3, payment_date = $4 \
         WHERE b.id = $1 RETURNING {BILLING_COLUMNS}"
    );
    let row: Option<BillingRow> = query_as(&sql)
        .bind(billing_id)
        .bind(&update.status)
        .bind(update.payment_method.as_deref())
        .bind(update.payment_date)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to update billing record"))?;

    row.map(billing_from_row)
        .ok_or_else(|| StorageError::not_found("Billing record", billing_id))
}

/// Newest first.
pub async fn list_for_patient(pool: &PgPool, patient_id: PatientId) -> StorageResult<Vec<BillingView>> {
    let sql = format!(
        "SELECT {BILLING_COLUMNS}, a.appointment_date, p.first_name, p.last_name \
         FROM billing b \
         JOIN appointments a ON a.id = b.appointment_id \
         JOIN patients p ON p.id = b.patient_id \
         WHERE b.patient_id = $1 \
         ORDER BY b.created_at DESC, b.id DESC"
    );
    let rows: Vec<BillingViewRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list billing records"))?;

    Ok(rows
        .into_iter()
        .map(|(a, b, c, d, e, f, g, h, i, date, first, last)| BillingView {
            billing: billing_from_row((a, b, c, d, e, f, g, h, i)),
            appointment_date: date,
            patient_first_name: first,
            patient_last_name: last,
        })
        .collect())
}
