//! Storage capability value types.

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Readable byte stream handed to `upload` and returned by `download`.
///
/// The stream is positioned at the start of the object; dropping it closes
/// the underlying reader.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Physical store a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Local filesystem.
    Local,
    /// S3-compatible object store (AWS S3, MinIO, Cloudflare R2).
    S3,
    /// Aliyun Object Storage Service.
    Oss,
    /// Tencent Cloud Object Storage.
    Cos,
}

impl StorageType {
    /// All supported storage types.
    pub const ALL: [Self; 4] = [Self::Local, Self::S3, Self::Oss, Self::Cos];

    /// Stable name used in configuration and persisted rows.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
            Self::Oss => "oss",
            Self::Cos => "cos",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" | "minio" => Ok(Self::S3),
            "oss" | "aliyun" => Ok(Self::Oss),
            "cos" | "tencent" => Ok(Self::Cos),
            _ => Err(StorageError::UnsupportedStorageType(s.to_string())),
        }
    }
}

/// Storage capability operation, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOperation {
    /// Write a new object.
    Upload,
    /// Remove an object.
    Delete,
    /// Relocate an object.
    Move,
    /// Resolve an access URL.
    GetUrl,
    /// Resolve a preview URL.
    GetPreviewUrl,
    /// Open an object for reading.
    Download,
}

impl StorageOperation {
    /// Metrics label value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::GetUrl => "get_url",
            Self::GetPreviewUrl => "get_preview_url",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of an object written by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Collision-free name assigned by the backend.
    pub generated_name: String,
    /// Object key inside the backend namespace.
    pub path: String,
    /// Access URL at upload time.
    pub url: String,
    /// Backend that holds the object.
    pub storage_type: StorageType,
    /// Bytes written.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("local", StorageType::Local)]
    #[case("S3", StorageType::S3)]
    #[case("minio", StorageType::S3)]
    #[case(" oss ", StorageType::Oss)]
    #[case("cos", StorageType::Cos)]
    fn test_parse_storage_type(#[case] input: &str, #[case] expected: StorageType) {
        assert_eq!(input.parse::<StorageType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_storage_type() {
        let err = "ftp".parse::<StorageType>().unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedStorageType(ref t) if t == "ftp"));
    }

    #[test]
    fn test_storage_type_round_trips_through_name() {
        for storage_type in StorageType::ALL {
            assert_eq!(storage_type.as_str().parse::<StorageType>().unwrap(), storage_type);
        }
    }
}
