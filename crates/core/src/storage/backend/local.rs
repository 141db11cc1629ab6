//! Local filesystem backend.

use opendal::services;

use super::{AccessUrl, OpendalStorage, Relocation, build_operator};
use crate::storage::config::StorageConfig;
use crate::storage::error::StorageError;
use crate::storage::types::StorageType;

impl OpendalStorage {
    /// Local directory served over HTTP at `base_url` + `public_path`.
    ///
    /// Intermediate directories are created on write. Moves are renames.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` if `root_path` is empty.
    pub fn local(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate(StorageType::Local)?;
        let local = &config.local;

        let op = build_operator(services::Fs::default().root(&local.root_path))?;
        let public_path = local.public_path.trim_matches('/');
        let base = local.base_url.trim_end_matches('/');
        let prefix = if public_path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{public_path}")
        };

        Ok(Self::from_operator(
            op,
            StorageType::Local,
            Relocation::Rename,
            AccessUrl::Public(prefix),
            config.preview_url.clone(),
        ))
    }
}
