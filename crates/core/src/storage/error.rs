//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// A required backend configuration field is empty.
    #[error("{backend} storage configuration is missing `{field}`")]
    MissingConfig {
        /// Backend whose configuration is incomplete.
        backend: &'static str,
        /// Name of the empty field.
        field: &'static str,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Configured storage type is not one of the supported backends.
    #[error("unsupported storage type: {0}")]
    UnsupportedStorageType(String),

    /// File extension has no preview mapping.
    #[error("unsupported preview type: {0}")]
    UnsupportedPreviewType(String),

    /// Streamed byte count differs from the declared size.
    #[error("size mismatch: declared {declared} bytes, received {received} bytes")]
    SizeMismatch {
        /// Size announced by the caller.
        declared: u64,
        /// Bytes actually read from the stream.
        received: u64,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// URL cache collaborator failed.
    #[error("url cache error: {0}")]
    Cache(String),

    /// Reading the upload stream failed.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a cache error.
    #[must_use]
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Returns `true` for errors caused by bad input rather than the backend.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig { .. }
                | Self::UnsupportedStorageType(_)
                | Self::UnsupportedPreviewType(_)
                | Self::SizeMismatch { .. }
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_names_field() {
        let err = StorageError::MissingConfig {
            backend: "s3",
            field: "bucket",
        };
        assert_eq!(err.to_string(), "s3 storage configuration is missing `bucket`");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_opendal_not_found_maps_to_not_found() {
        let err: StorageError =
            opendal::Error::new(opendal::ErrorKind::NotFound, "no such key").into();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_opendal_other_maps_to_operation() {
        let err: StorageError =
            opendal::Error::new(opendal::ErrorKind::Unexpected, "boom").into();
        assert!(matches!(err, StorageError::Operation(_)));
    }
}
