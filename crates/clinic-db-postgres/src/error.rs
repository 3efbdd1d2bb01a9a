//! Error types for the PostgreSQL backend.

use clinic_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// Errors raised while setting up the backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => StorageError::database(e.to_string()),
            PostgresError::Migration(e) => StorageError::database(format!("Migration error: {e}")),
            PostgresError::Config { message } => {
                StorageError::database(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Result type alias for PostgreSQL setup operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

/// Message for a violated unique constraint.
fn unique_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_key") => "Username already exists",
        Some("patients_email_key" | "healthcare_providers_email_key") => "Email already registered",
        Some("patients_user_id_key") => "User already has a patient profile",
        Some("healthcare_providers_user_id_key") => "User already has a provider profile",
        _ => "Duplicate value",
    }
}

/// Message for a violated foreign key.
fn reference_message(constraint: Option<&str>) -> &'static str {
    let constraint = constraint.unwrap_or_default();
    if constraint.ends_with("patient_id_fkey") {
        "Referenced patient does not exist"
    } else if constraint.ends_with("provider_id_fkey") {
        "Referenced provider does not exist"
    } else if constraint.ends_with("appointment_id_fkey") {
        "Referenced appointment does not exist"
    } else if constraint.ends_with("user_id_fkey") {
        "Referenced user does not exist"
    } else {
        "Referenced row does not exist"
    }
}

/// Message for SQLSTATE data exceptions caused by client input.
fn data_exception_message(code: &str) -> Option<&'static str> {
    match code {
        // string_data_right_truncation
        "22001" => Some("Value too long for field"),
        // numeric_value_out_of_range
        "22003" => Some("Numeric value out of range"),
        // invalid_datetime_format, datetime_field_overflow
        "22007" | "22008" => Some("Invalid date or time"),
        _ => None,
    }
}

/// Maps a query error onto the storage taxonomy.
///
/// Constraint violations become `Conflict`, `NotFound` or `InvalidInput`,
/// as do data exceptions such as an over-long string. Everything else is
/// a `Database` error carrying `context`.
pub(crate) fn map_query_error(err: SqlxError, context: &str) -> StorageError {
    if let SqlxError::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::conflict(unique_message(db_err.constraint()));
        }
        if db_err.is_foreign_key_violation() {
            return StorageError::missing_reference(reference_message(db_err.constraint()));
        }
        if let Some(message) = db_err.code().as_deref().and_then(data_exception_message) {
            return StorageError::invalid_input(message);
        }
        if db_err.is_check_violation() {
            return StorageError::invalid_input(format!(
                "Value rejected by {}",
                db_err.constraint().unwrap_or("a check constraint")
            ));
        }
    }
    tracing::debug!(error = %err, context, "Query failed");
    StorageError::database(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgresError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));

        let err = PostgresError::Migration("syntax error".into());
        assert!(err.to_string().contains("Migration error"));
    }

    #[test]
    fn test_conversion_to_storage_error() {
        let storage_err: StorageError = PostgresError::config("test error").into();
        assert!(storage_err.is_internal());
    }

    #[test]
    fn test_constraint_messages() {
        assert_eq!(unique_message(Some("users_username_key")), "Username already exists");
        assert_eq!(
            unique_message(Some("healthcare_providers_email_key")),
            "Email already registered"
        );
        assert_eq!(unique_message(None), "Duplicate value");
        assert_eq!(
            reference_message(Some("appointments_provider_id_fkey")),
            "Referenced provider does not exist"
        );
        assert_eq!(
            reference_message(Some("billing_appointment_id_fkey")),
            "Referenced appointment does not exist"
        );
    }

    #[test]
    fn test_data_exceptions_are_client_errors() {
        assert_eq!(data_exception_message("22001"), Some("Value too long for field"));
        assert_eq!(data_exception_message("22003"), Some("Numeric value out of range"));
        // unique_violation and connection failures are handled elsewhere
        assert_eq!(data_exception_message("23505"), None);
        assert_eq!(data_exception_message("08006"), None);
    }

    #[test]
    fn test_non_database_errors_are_internal() {
        let err = map_query_error(SqlxError::RowNotFound, "Failed to load patient");
        assert!(err.is_internal());
        assert!(err.to_string().contains("Failed to load patient"));
    }
}
