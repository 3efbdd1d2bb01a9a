use axum::{Json, extract::State};
use clinic_api::{ApiError, ApiResult};
use clinic_auth::{Action, BearerAuth, ResourceRef};
use clinic_storage::{AppointmentStatusCount, DateRange, RevenueByStatus};
use serde::Deserialize;
use time::Date;
use time::macros::format_description;

use crate::extract::ApiQuery;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ReportParams {
    /// Both bounds are required and inclusive.
    fn range(&self) -> ApiResult<DateRange> {
        let start = parse_date("start_date", self.start_date.as_deref())?;
        let end = parse_date("end_date", self.end_date.as_deref())?;
        Ok(DateRange::new(start, end)?)
    }
}

fn parse_date(name: &str, value: Option<&str>) -> ApiResult<Date> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))?;
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::bad_request(format!("{name} must be a date in YYYY-MM-DD format")))
}

pub async fn appointment_report(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<Vec<AppointmentStatusCount>>> {
    state
        .authorize(&principal, Action::ViewAppointmentReport, ResourceRef::None)
        .await?;
    let range = params.range()?;
    Ok(Json(state.storage.appointment_report(&range).await?))
}

pub async fn revenue_report(
    State(state): State<AppState>,
    BearerAuth(principal): BearerAuth,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<Vec<RevenueByStatus>>> {
    state
        .authorize(&principal, Action::ViewRevenueReport, ResourceRef::None)
        .await?;
    let range = params.range()?;
    Ok(Json(state.storage.revenue_report(&range).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn params(start: Option<&str>, end: Option<&str>) -> ReportParams {
        ReportParams {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn parses_inclusive_range() {
        let range = params(Some("2024-01-01"), Some("2024-01-31")).range().unwrap();
        assert_eq!(range.start(), date!(2024 - 01 - 01));
        assert_eq!(range.end(), date!(2024 - 01 - 31));
    }

    #[test]
    fn rejects_missing_malformed_and_reversed_dates() {
        for (start, end) in [
            (None, Some("2024-01-31")),
            (Some("2024-01-01"), None),
            (Some("01/01/2024"), Some("2024-01-31")),
            (Some("2024-02-01"), Some("2024-01-31")),
        ] {
            let err = params(start, end).range().unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{start:?}..{end:?}");
        }
    }
}
