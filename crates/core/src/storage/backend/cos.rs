//! Tencent COS backend.

use opendal::services;

use super::{AccessUrl, OpendalStorage, Relocation, build_operator};
use crate::storage::config::StorageConfig;
use crate::storage::error::StorageError;
use crate::storage::types::StorageType;

impl OpendalStorage {
    /// Tencent COS bucket. The bucket name carries the APPID suffix.
    ///
    /// The client addresses the region through the endpoint. `region` is
    /// still required by [`StorageConfig::validate`] like every object store.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first empty required field, or a
    /// configuration error if the client cannot be built.
    pub fn cos(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate(StorageType::Cos)?;
        let cos = &config.cos;

        let builder = services::Cos::default()
            .endpoint(&cos.endpoint)
            .bucket(&cos.bucket)
            .secret_id(&cos.secret_id)
            .secret_key(&cos.secret_key);

        Ok(Self::from_operator(
            build_operator(builder)?,
            StorageType::Cos,
            Relocation::CopyThenDelete,
            AccessUrl::public_or_presigned(&cos.public_url, config.url_expiry()),
            config.preview_url.clone(),
        ))
    }
}
