//! Administrative aggregates.

use bigdecimal::BigDecimal;
use clinic_storage::{AppointmentStatusCount, DateRange, RevenueByStatus, StorageResult};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;

use super::parse_status;
use crate::error::map_query_error;

/// Statuses are ordered bytewise so both backends agree on the order.
pub async fn appointment_counts(
    pool: &PgPool,
    range: &DateRange,
) -> StorageResult<Vec<AppointmentStatusCount>> {
    let rows: Vec<(String, i64)> = query_as(
        r#"SELECT status, COUNT(*)
           FROM appointments
           WHERE appointment_date BETWEEN $1 AND $2
           GROUP BY status
           ORDER BY status COLLATE "C""#,
    )
    .bind(range.start())
    .bind(range.end())
    .fetch_all(pool)
    .await
    .map_err(|e| map_query_error(e, "Failed to build appointment report"))?;

    rows.into_iter()
        .map(|(status, count)| {
            Ok(AppointmentStatusCount {
                status: parse_status(&status)?,
                count,
            })
        })
        .collect()
}

/// Billing rows fall in the range by the UTC day of `created_at`.
pub async fn revenue_by_status(
    pool: &PgPool,
    range: &DateRange,
) -> StorageResult<Vec<RevenueByStatus>> {
    let rows: Vec<(String, BigDecimal, i64)> = query_as(
        r#"SELECT status, COALESCE(SUM(amount), 0), COUNT(*)
           FROM billing
           WHERE (created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
           GROUP BY status
           ORDER BY status COLLATE "C""#,
    )
    .bind(range.start())
    .bind(range.end())
    .fetch_all(pool)
    .await
    .map_err(|e| map_query_error(e, "Failed to build revenue report"))?;

    Ok(rows
        .into_iter()
        .map(|(status, total_amount, count)| RevenueByStatus {
            status,
            total_amount,
            count,
        })
        .collect())
}
