//! Patient and provider profiles.

use clinic_auth::{PatientId, ProviderId, UserId};
use clinic_storage::{
    PatientDetails, PatientRecord, PatientView, ProviderDetails, ProviderRecord, ProviderView,
    StorageError, StorageResult,
};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::{Date, OffsetDateTime};

use crate::error::map_query_error;

type PatientRow = (
    PatientId,
    UserId,
    String,
    String,
    Option<Date>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    OffsetDateTime,
);

type PatientViewRow = (
    PatientId,
    UserId,
    String,
    String,
    Option<Date>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    OffsetDateTime,
    String,
);

type ProviderViewRow = (
    ProviderId,
    UserId,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    OffsetDateTime,
    String,
);

const PATIENT_COLUMNS: &str = "p.id, p.user_id, p.first_name, p.last_name, p.date_of_birth, \
     p.gender, p.address, p.phone, p.email, p.insurance_provider, p.insurance_number, \
     p.created_at";

const PROVIDER_COLUMNS: &str = "hp.id, hp.user_id, hp.first_name, hp.last_name, \
     hp.specialization, hp.phone, hp.email, hp.department, hp.created_at";

fn patient_from_row(row: PatientRow) -> PatientRecord {
    let (
        id,
        user_id,
        first_name,
        last_name,
        date_of_birth,
        gender,
        address,
        phone,
        email,
        insurance_provider,
        insurance_number,
        created_at,
    ) = row;
    PatientRecord {
        id,
        user_id,
        details: PatientDetails {
            first_name,
            last_name,
            date_of_birth,
            gender,
            address,
            phone,
            email,
            insurance_provider,
            insurance_number,
        },
        created_at,
    }
}

fn patient_view_from_row(row: PatientViewRow) -> PatientView {
    let (a, b, c, d, e, f, g, h, i, j, k, l, username) = row;
    PatientView {
        patient: patient_from_row((a, b, c, d, e, f, g, h, i, j, k, l)),
        username,
    }
}

fn provider_view_from_row(row: ProviderViewRow) -> ProviderView {
    let (
        id,
        user_id,
        first_name,
        last_name,
        specialization,
        phone,
        email,
        department,
        created_at,
        username,
    ) = row;
    ProviderView {
        provider: ProviderRecord {
            id,
            user_id,
            details: ProviderDetails {
                first_name,
                last_name,
                specialization,
                phone,
                email,
                department,
            },
            created_at,
        },
        username,
    }
}

pub async fn list_patients(pool: &PgPool) -> StorageResult<Vec<PatientView>> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS}, u.username FROM patients p \
         JOIN users u ON u.id = p.user_id ORDER BY p.id"
    );
    let rows: Vec<PatientViewRow> = query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list patients"))?;

    Ok(rows.into_iter().map(patient_view_from_row).collect())
}

pub async fn get_patient(pool: &PgPool, patient_id: PatientId) -> StorageResult<Option<PatientView>> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS}, u.username FROM patients p \
         JOIN users u ON u.id = p.user_id WHERE p.id = $1"
    );
    let row: Option<PatientViewRow> = query_as(&sql)
        .bind(patient_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to load patient"))?;

    Ok(row.map(patient_view_from_row))
}

pub async fn update_patient(
    pool: &PgPool,
    patient_id: PatientId,
    details: &PatientDetails,
) -> StorageResult<PatientRecord> {
    let sql = format!(
        "UPDATE patients p SET first_name = $2, last_name = $3, date_of_birth = $4, \
         gender = $5, address = $6, phone = $7, email = $8, insurance_provider = $9, \
         insurance_number = $10 WHERE p.id = $1 RETURNING {PATIENT_COLUMNS}"
    );
    let row: Option<PatientRow> = query_as(&sql)
        .bind(patient_id)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(details.date_of_birth)
        .bind(details.gender.as_deref())
        .bind(details.address.as_deref())
        .bind(details.phone.as_deref())
        .bind(details.email.as_deref())
        .bind(details.insurance_provider.as_deref())
        .bind(details.insurance_number.as_deref())
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to update patient"))?;

    row.map(patient_from_row)
        .ok_or_else(|| StorageError::not_found("Patient", patient_id))
}

pub async fn list_providers(pool: &PgPool) -> StorageResult<Vec<ProviderView>> {
    let sql = format!(
        "SELECT {PROVIDER_COLUMNS}, u.username FROM healthcare_providers hp \
         JOIN users u ON u.id = hp.user_id ORDER BY hp.id"
    );
    let rows: Vec<ProviderViewRow> = query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to list providers"))?;

    Ok(rows.into_iter().map(provider_view_from_row).collect())
}

pub async fn get_provider(
    pool: &PgPool,
    provider_id: ProviderId,
) -> StorageResult<Option<ProviderView>> {
    let sql = format!(
        "SELECT {PROVIDER_COLUMNS}, u.username FROM healthcare_providers hp \
         JOIN users u ON u.id = hp.user_id WHERE hp.id = $1"
    );
    let row: Option<ProviderViewRow> = query_as(&sql)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to load provider"))?;

    Ok(row.map(provider_view_from_row))
}
