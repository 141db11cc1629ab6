//! S3-compatible backend (AWS S3, MinIO, Cloudflare R2).

use opendal::services;

use super::{AccessUrl, OpendalStorage, Relocation, build_operator};
use crate::storage::config::StorageConfig;
use crate::storage::error::StorageError;
use crate::storage::types::StorageType;

impl OpendalStorage {
    /// S3-compatible bucket.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first empty required field, or a
    /// configuration error if the client cannot be built.
    pub fn s3(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate(StorageType::S3)?;
        let s3 = &config.s3;

        let builder = services::S3::default()
            .endpoint(&s3.endpoint)
            .bucket(&s3.bucket)
            .access_key_id(&s3.access_key)
            .secret_access_key(&s3.secret_key)
            .region(&s3.region);

        Ok(Self::from_operator(
            build_operator(builder)?,
            StorageType::S3,
            Relocation::CopyThenDelete,
            AccessUrl::public_or_presigned(&s3.public_url, config.url_expiry()),
            config.preview_url.clone(),
        ))
    }
}
