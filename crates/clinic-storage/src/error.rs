//! Storage error types.

use std::fmt::Display;

use clinic_api::ApiError;
use clinic_auth::AuthError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The row, or a row it references, does not exist.
    #[error("{message}")]
    NotFound {
        /// Which row was missing.
        message: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{message}")]
    Conflict {
        /// Which value already exists.
        message: String,
    },

    /// The input was rejected before or by the store.
    #[error("{message}")]
    InvalidInput {
        /// Description of why the input is invalid.
        message: String,
    },

    /// The backend failed.
    #[error("Database error: {message}")]
    Database {
        /// Description of the backend failure.
        message: String,
    },

    /// A transaction could not be started, committed or rolled back.
    #[error("Transaction error: {message}")]
    Transaction {
        /// Description of the transaction error.
        message: String,
    },
}

impl StorageError {
    /// Creates a `NotFound` error for a primary key lookup.
    #[must_use]
    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::NotFound {
            message: format!("{entity} {id} not found"),
        }
    }

    /// Creates a `NotFound` error for a dangling reference.
    #[must_use]
    pub fn missing_reference(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Creates a new `Transaction` error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` for backend failures that map to a 500.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Transaction { .. })
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { message } => ApiError::not_found(message),
            StorageError::Conflict { message } => ApiError::conflict(message),
            StorageError::InvalidInput { message } => ApiError::bad_request(message),
            err @ (StorageError::Database { .. } | StorageError::Transaction { .. }) => {
                tracing::error!(error = %err, "Storage operation failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { message } => AuthError::not_found(message),
            other => AuthError::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_api::ApiError;

    #[test]
    fn not_found_message() {
        let err = StorageError::not_found("Patient", 42);
        assert_eq!(err.to_string(), "Patient 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn maps_onto_api_taxonomy() {
        assert_eq!(
            ApiError::from(StorageError::conflict("Username already exists")).code(),
            "CONFLICT"
        );
        assert_eq!(
            ApiError::from(StorageError::invalid_input("amount must not be negative")).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            ApiError::from(StorageError::not_found("Appointment", 5)).code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn backend_failures_hide_details() {
        let api = ApiError::from(StorageError::database("relation \"users\" does not exist"));
        assert_eq!(api.code(), "INTERNAL");
        assert!(!api.to_string().contains("relation"));

        let api = ApiError::from(StorageError::transaction("commit failed"));
        assert_eq!(api.code(), "INTERNAL");
    }

    #[test]
    fn ownership_lookup_failures() {
        assert!(matches!(
            AuthError::from(StorageError::not_found("Patient", 1)),
            AuthError::NotFound { .. }
        ));
        assert!(AuthError::from(StorageError::database("timeout")).is_server_error());
    }
}
