//! Authentication and authorization error types.

use std::fmt;

use clinic_api::ApiError;

/// Errors that can occur during authentication and authorization.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request lacks credentials or they are malformed.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The bearer token is invalid, malformed, or has a bad signature.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The bearer token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Username/password pair did not match. Never says which half failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The principal is authenticated but not allowed to perform the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// A row needed for an ownership check does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Which row was missing.
        message: String,
    },

    /// An ownership lookup failed in the record store.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an authentication error (401 category).
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::TokenExpired
                | Self::InvalidCredentials
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::InvalidToken { .. } | Self::TokenExpired => ErrorCategory::Token,
            Self::Forbidden { .. } | Self::NotFound { .. } => ErrorCategory::Authorization,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of auth errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Authentication,
    Authorization,
    Token,
    Infrastructure,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized { message } | AuthError::InvalidToken { message } => {
                ApiError::unauthorized(message)
            }
            AuthError::TokenExpired => ApiError::unauthorized("Token has expired"),
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::Forbidden { message } => ApiError::forbidden(message),
            AuthError::NotFound { message } => ApiError::not_found(message),
            err @ (AuthError::Storage { .. } | AuthError::Internal { .. }) => {
                tracing::error!(error = %err, category = %err.category(), "Authorization failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}
