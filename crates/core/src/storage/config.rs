//! Storage configuration types.

use std::time::Duration;

use serde::Deserialize;

use super::error::StorageError;
use super::types::StorageType;

/// Local filesystem backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory objects are written under.
    pub root_path: String,
    /// URL path prefix the directory is served under, e.g. `/files`.
    pub public_path: String,
    /// Scheme and host of the file server, e.g. `http://localhost:8080`.
    pub base_url: String,
}

/// S3-compatible backend settings (AWS S3, MinIO, Cloudflare R2).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// S3 endpoint URL.
    pub endpoint: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Region.
    pub region: String,
    /// Public base URL; signed URLs are issued when empty.
    pub public_url: String,
}

/// Aliyun OSS backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OssConfig {
    /// OSS endpoint, e.g. `https://oss-cn-hangzhou.aliyuncs.com`.
    pub endpoint: String,
    /// AccessKey ID.
    pub access_key_id: String,
    /// AccessKey secret.
    pub access_key_secret: String,
    /// Bucket name.
    pub bucket: String,
    /// Region, e.g. `cn-hangzhou`.
    pub region: String,
    /// Public base URL; signed URLs are issued when empty.
    pub public_url: String,
}

/// Tencent COS backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CosConfig {
    /// COS endpoint, e.g. `https://cos.ap-guangzhou.myqcloud.com`.
    pub endpoint: String,
    /// SecretId.
    pub secret_id: String,
    /// SecretKey.
    pub secret_key: String,
    /// Bucket name including the APPID suffix.
    pub bucket: String,
    /// Region, e.g. `ap-guangzhou`.
    pub region: String,
    /// Public base URL; signed URLs are issued when empty.
    pub public_url: String,
}

/// Buffer pool settings for streamed I/O.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Wrap backends in the pooling decorator.
    pub enabled: bool,
    /// Size of each pooled buffer in bytes.
    pub buffer_size: usize,
    /// Maximum idle buffers kept for reuse.
    pub max_idle: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: 64 * 1024,
            max_idle: 64,
        }
    }
}

/// Storage configuration consumed by the factory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Active backend selector (`local`, `s3`, `oss`, `cos`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Local filesystem settings.
    pub local: LocalConfig,
    /// S3-compatible settings.
    pub s3: S3Config,
    /// Aliyun OSS settings.
    pub oss: OssConfig,
    /// Tencent COS settings.
    pub cos: CosConfig,
    /// Base URL of the external document preview service.
    pub preview_url: String,
    /// TTL for cached URL lookups in seconds; 0 disables the cache decorator.
    pub cache_ttl_secs: u64,
    /// Lifetime of signed URLs in seconds.
    pub url_expiry_secs: u64,
    /// Buffer pool settings.
    pub buffer_pool: BufferPoolConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageType::Local.as_str().to_string(),
            local: LocalConfig::default(),
            s3: S3Config::default(),
            oss: OssConfig::default(),
            cos: CosConfig::default(),
            preview_url: String::new(),
            cache_ttl_secs: Self::DEFAULT_CACHE_TTL,
            url_expiry_secs: Self::DEFAULT_URL_EXPIRY,
            buffer_pool: BufferPoolConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Default URL cache TTL: 10 minutes.
    pub const DEFAULT_CACHE_TTL: u64 = 600;
    /// Default signed URL lifetime: 24 hours.
    pub const DEFAULT_URL_EXPIRY: u64 = 86_400;

    /// Create a local filesystem configuration with default settings.
    #[must_use]
    pub fn local(root_path: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            local: LocalConfig {
                root_path: root_path.into(),
                public_path: "/files".to_string(),
                base_url: base_url.into(),
            },
            ..Self::default()
        }
    }

    /// Resolve the active backend selector.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedStorageType` if the selector is unknown.
    pub fn current_type(&self) -> Result<StorageType, StorageError> {
        self.kind.parse()
    }

    /// Set the preview service URL.
    #[must_use]
    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = url.into();
        self
    }

    /// Set the URL cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// URL cache TTL, `None` when caching is disabled.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Signed URL lifetime.
    #[must_use]
    pub fn url_expiry(&self) -> Duration {
        Duration::from_secs(self.url_expiry_secs.max(1))
    }

    /// Validate the settings of one backend.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first empty required field.
    pub fn validate(&self, storage_type: StorageType) -> Result<(), StorageError> {
        let backend = storage_type.as_str();
        let required: Vec<(&'static str, &str)> = match storage_type {
            StorageType::Local => vec![("root_path", self.local.root_path.as_str())],
            StorageType::S3 => vec![
                ("endpoint", self.s3.endpoint.as_str()),
                ("access_key", self.s3.access_key.as_str()),
                ("secret_key", self.s3.secret_key.as_str()),
                ("bucket", self.s3.bucket.as_str()),
                ("region", self.s3.region.as_str()),
            ],
            StorageType::Oss => vec![
                ("endpoint", self.oss.endpoint.as_str()),
                ("access_key_id", self.oss.access_key_id.as_str()),
                ("access_key_secret", self.oss.access_key_secret.as_str()),
                ("bucket", self.oss.bucket.as_str()),
                ("region", self.oss.region.as_str()),
            ],
            StorageType::Cos => vec![
                ("endpoint", self.cos.endpoint.as_str()),
                ("secret_id", self.cos.secret_id.as_str()),
                ("secret_key", self.cos.secret_key.as_str()),
                ("bucket", self.cos.bucket.as_str()),
                ("region", self.cos.region.as_str()),
            ],
        };

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(StorageError::MissingConfig { backend, field }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_config() -> StorageConfig {
        StorageConfig {
            kind: "s3".to_string(),
            s3: S3Config {
                endpoint: "http://127.0.0.1:9000".to_string(),
                access_key: "minio".to_string(),
                secret_key: "minio123".to_string(),
                bucket: "files".to_string(),
                region: "us-east-1".to_string(),
                public_url: String::new(),
            },
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.current_type().unwrap(), StorageType::Local);
        assert_eq!(config.url_expiry(), Duration::from_secs(86_400));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
        assert!(config.buffer_pool.enabled);
    }

    #[test]
    fn test_cache_disabled_with_zero_ttl() {
        let config = StorageConfig::default().with_cache_ttl(0);
        assert_eq!(config.cache_ttl(), None);
    }

    #[test]
    fn test_validate_complete_s3() {
        assert!(s3_config().validate(StorageType::S3).is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut config = s3_config();
        config.s3.bucket = "  ".to_string();
        let err = config.validate(StorageType::S3).unwrap_err();
        assert!(matches!(
            err,
            StorageError::MissingConfig {
                backend: "s3",
                field: "bucket"
            }
        ));
    }

    #[test]
    fn test_validate_unconfigured_backends() {
        let config = StorageConfig::default();
        assert!(matches!(
            config.validate(StorageType::Local),
            Err(StorageError::MissingConfig { field: "root_path", .. })
        ));
        assert!(matches!(
            config.validate(StorageType::Oss),
            Err(StorageError::MissingConfig { field: "endpoint", .. })
        ));
        assert!(matches!(
            config.validate(StorageType::Cos),
            Err(StorageError::MissingConfig { field: "endpoint", .. })
        ));
    }

    #[test]
    fn test_every_object_store_requires_region() {
        let mut config = StorageConfig::default();
        config.oss = OssConfig {
            endpoint: "https://oss-cn-hangzhou.aliyuncs.com".to_string(),
            access_key_id: "id".to_string(),
            access_key_secret: "secret".to_string(),
            bucket: "files".to_string(),
            region: String::new(),
            public_url: String::new(),
        };
        config.cos = CosConfig {
            endpoint: "https://cos.ap-guangzhou.myqcloud.com".to_string(),
            secret_id: "id".to_string(),
            secret_key: "secret".to_string(),
            bucket: "files-1250000000".to_string(),
            region: String::new(),
            public_url: String::new(),
        };

        for storage_type in [StorageType::Oss, StorageType::Cos] {
            assert!(matches!(
                config.validate(storage_type),
                Err(StorageError::MissingConfig { field: "region", .. })
            ));
        }

        config.oss.region = "cn-hangzhou".to_string();
        config.cos.region = "ap-guangzhou".to_string();
        assert!(config.validate(StorageType::Oss).is_ok());
        assert!(config.validate(StorageType::Cos).is_ok());
    }

    #[test]
    fn test_unknown_selector() {
        let config = StorageConfig {
            kind: "ftp".to_string(),
            ..StorageConfig::default()
        };
        assert!(matches!(
            config.current_type(),
            Err(StorageError::UnsupportedStorageType(_))
        ));
    }
}
