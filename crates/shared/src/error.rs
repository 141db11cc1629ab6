//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every variant carries a human-readable message; the reason code and the
/// HTTP-style status are derived from the variant.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation not allowed in the current state of the resource.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Access to a shared resource was refused.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Access to a shared resource that has expired.
    #[error("Gone: {0}")]
    Gone(String),

    /// Object storage backend failed.
    #[error("Storage backend error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) | Self::InvalidOperation(_) => 409,
            Self::Forbidden(_) => 403,
            Self::Gone(_) => 410,
            Self::Storage(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns `true` when the caller is at fault (4xx).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        let status = self.status_code();
        status >= 400 && status < 500
    }
}
