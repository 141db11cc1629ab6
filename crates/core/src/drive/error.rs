//! Drive operation error types.
//!
//! Every variant maps to a stable reason code and an HTTP-style status so
//! callers can surface errors without inspecting messages.

use thiserror::Error;

use stowage_shared::AppError;

use super::password::PasswordError;
use crate::storage::StorageError;

/// Errors that can occur during file, folder, and share operations.
#[derive(Debug, Error)]
pub enum DriveError {
    /// File not found.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Folder not found.
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    /// Share code not found.
    #[error("share not found: {0}")]
    ShareNotFound(String),

    /// A sibling folder already uses the name.
    #[error("folder already exists: {0}")]
    AlreadyExists(String),

    /// Input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Folder still owns files or subfolders.
    #[error("folder not empty: {0}")]
    FolderNotEmpty(String),

    /// Self-move, cyclic move, or move into own subtree.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Operation not allowed in the file's current lifecycle state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Share link has expired.
    #[error("share expired: {0}")]
    ShareExpired(String),

    /// Share password missing or wrong.
    #[error("share password incorrect")]
    SharePasswordIncorrect,

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Backend(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// Share password hashing or verification failed.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl DriveError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid move error.
    #[must_use]
    pub fn invalid_move(msg: impl Into<String>) -> Self {
        Self::InvalidMove(msg.into())
    }

    /// Create an invalid operation error.
    #[must_use]
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Stable reason code for API responses.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::FolderNotFound(_) => "FOLDER_NOT_FOUND",
            Self::ShareNotFound(_) => "SHARE_NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::FolderNotEmpty(_) => "FOLDER_NOT_EMPTY",
            Self::InvalidMove(_) => "INVALID_MOVE_OPERATION",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::ShareExpired(_) => "SHARE_EXPIRED",
            Self::SharePasswordIncorrect => "SHARE_PASSWORD_INCORRECT",
            Self::Backend(err) if err.is_invalid_input() => "INVALID_INPUT",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Repository(_) => "REPOSITORY_ERROR",
            Self::Password(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-style status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::FileNotFound(_) | Self::FolderNotFound(_) | Self::ShareNotFound(_) => 404,
            Self::AlreadyExists(_)
            | Self::FolderNotEmpty(_)
            | Self::InvalidMove(_)
            | Self::InvalidOperation(_) => 409,
            Self::InvalidInput(_) => 400,
            Self::ShareExpired(_) => 410,
            Self::SharePasswordIncorrect => 403,
            Self::Backend(err) if err.is_invalid_input() => 400,
            Self::Backend(_) => 502,
            Self::Repository(_) | Self::Password(_) => 500,
        }
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        let message = err.to_string();
        match err {
            DriveError::FileNotFound(_)
            | DriveError::FolderNotFound(_)
            | DriveError::ShareNotFound(_) => Self::NotFound(message),
            DriveError::AlreadyExists(_) => Self::Conflict(message),
            DriveError::InvalidInput(_) => Self::Validation(message),
            DriveError::FolderNotEmpty(_)
            | DriveError::InvalidMove(_)
            | DriveError::InvalidOperation(_) => Self::InvalidOperation(message),
            DriveError::ShareExpired(_) => Self::Gone(message),
            DriveError::SharePasswordIncorrect => Self::Forbidden(message),
            DriveError::Backend(ref storage) if storage.is_invalid_input() => {
                Self::Validation(message)
            }
            DriveError::Backend(_) => Self::Storage(message),
            DriveError::Repository(_) => Self::Database(message),
            DriveError::Password(_) => Self::Internal(message),
        }
    }
}
