//! Users, registration inserts and ownership lookups.

use clinic_auth::{PatientId, ProviderId, Role, UserId};
use clinic_storage::{
    NewUser, PatientDetails, PatientRecord, ProviderDetails, ProviderRecord, StorageError,
    StorageResult, UserRecord,
};
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::{PgPool, PgTransaction};
use time::OffsetDateTime;

use crate::error::map_query_error;

type UserRow = (UserId, String, String, String, OffsetDateTime);

fn user_from_row((id, username, password_hash, role, created_at): UserRow) -> StorageResult<UserRecord> {
    let role = role
        .parse::<Role>()
        .map_err(|e| StorageError::database(format!("users row {id}: {e}")))?;
    Ok(UserRecord {
        id,
        username,
        password_hash,
        role,
        created_at,
    })
}

pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> StorageResult<Option<UserRecord>> {
    let row: Option<UserRow> = query_as(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| map_query_error(e, "Failed to load user"))?;

    row.map(user_from_row).transpose()
}

pub async fn insert_user(tx: &mut PgTransaction<'_>, user: &NewUser) -> StorageResult<UserRecord> {
    let row: UserRow = query_as(
        r#"INSERT INTO users (username, password_hash, role)
           VALUES ($1, $2, $3)
           RETURNING id, username, password_hash, role, created_at"#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_query_error(e, "Failed to insert user"))?;

    user_from_row(row)
}

pub async fn insert_patient(
    tx: &mut PgTransaction<'_>,
    user_id: UserId,
    details: &PatientDetails,
) -> StorageResult<PatientRecord> {
    let (id, created_at): (PatientId, OffsetDateTime) = query_as(
        r#"INSERT INTO patients
             (user_id, first_name, last_name, date_of_birth, gender, address, phone, email,
              insurance_provider, insurance_number)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING id, created_at"#,
    )
    .bind(user_id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(details.date_of_birth)
    .bind(details.gender.as_deref())
    .bind(details.address.as_deref())
    .bind(details.phone.as_deref())
    .bind(details.email.as_deref())
    .bind(details.insurance_provider.as_deref())
    .bind(details.insurance_number.as_deref())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_query_error(e, "Failed to insert patient"))?;

    Ok(PatientRecord {
        id,
        user_id,
        details: details.clone(),
        created_at,
    })
}

pub async fn insert_provider(
    tx: &mut PgTransaction<'_>,
    user_id: UserId,
    details: &ProviderDetails,
) -> StorageResult<ProviderRecord> {
    let (id, created_at): (ProviderId, OffsetDateTime) = query_as(
        r#"INSERT INTO healthcare_providers
             (user_id, first_name, last_name, specialization, phone, email, department)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING id, created_at"#,
    )
    .bind(user_id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(details.specialization.as_deref())
    .bind(details.phone.as_deref())
    .bind(details.email.as_deref())
    .bind(details.department.as_deref())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_query_error(e, "Failed to insert provider"))?;

    Ok(ProviderRecord {
        id,
        user_id,
        details: details.clone(),
        created_at,
    })
}

pub async fn patient_owner(pool: &PgPool, patient_id: PatientId) -> StorageResult<Option<UserId>> {
    query_scalar("SELECT user_id FROM patients WHERE id = $1")
        .bind(patient_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to resolve patient owner"))
}

pub async fn provider_owner(
    pool: &PgPool,
    provider_id: ProviderId,
) -> StorageResult<Option<UserId>> {
    query_scalar("SELECT user_id FROM healthcare_providers WHERE id = $1")
        .bind(provider_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to resolve provider owner"))
}

pub async fn provider_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> StorageResult<Option<ProviderId>> {
    query_scalar("SELECT id FROM healthcare_providers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, "Failed to resolve provider of user"))
}
