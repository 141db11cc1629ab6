//! Aliyun OSS backend.

use opendal::services;

use super::{AccessUrl, OpendalStorage, Relocation, build_operator};
use crate::storage::config::StorageConfig;
use crate::storage::error::StorageError;
use crate::storage::types::StorageType;

impl OpendalStorage {
    /// Aliyun OSS bucket.
    ///
    /// The client addresses the region through the endpoint. `region` is
    /// still required by [`StorageConfig::validate`] like every object store.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first empty required field, or a
    /// configuration error if the client cannot be built.
    pub fn oss(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate(StorageType::Oss)?;
        let oss = &config.oss;

        let builder = services::Oss::default()
            .endpoint(&oss.endpoint)
            .bucket(&oss.bucket)
            .access_key_id(&oss.access_key_id)
            .access_key_secret(&oss.access_key_secret);

        Ok(Self::from_operator(
            build_operator(builder)?,
            StorageType::Oss,
            Relocation::CopyThenDelete,
            AccessUrl::public_or_presigned(&oss.public_url, config.url_expiry()),
            config.preview_url.clone(),
        ))
    }
}
