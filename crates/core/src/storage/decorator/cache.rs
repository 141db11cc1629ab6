//! TTL cache for URL lookups.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::drive::File;
use crate::storage::cache::KvCache;
use crate::storage::capability::Storage;
use crate::storage::error::StorageError;
use crate::storage::types::{ByteStream, StorageType, StoredObject};

/// Cache key for the access URL of `path`.
#[must_use]
pub fn url_cache_key(path: &str) -> String {
    format!("cache:url:{path}")
}

/// Cache key for the preview URL of `path`.
#[must_use]
pub fn preview_cache_key(path: &str) -> String {
    format!("cache:preview:{path}")
}

/// Caches `get_url` and `get_preview_url` results for a bounded TTL.
///
/// Delete and move evict both keys of every affected path before the inner
/// call, so a structural change never leaves a stale URL behind. If eviction
/// fails the operation fails without touching the backend. Cache read and
/// write failures only cost a backend call.
pub struct CacheStorage {
    inner: Arc<dyn Storage>,
    cache: Arc<dyn KvCache>,
    ttl: Duration,
}

impl CacheStorage {
    /// Wrap `inner`, caching URLs in `cache` for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>, cache: Arc<dyn KvCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn cached(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(err) => {
                warn!(key = %key, error = %err, "url cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn remember(&self, key: &str, value: &str) {
        if let Err(err) = self.cache.set(key, value, self.ttl).await {
            warn!(key = %key, error = %err, "failed to populate url cache");
        }
    }

    async fn evict(&self, path: &str) -> Result<(), StorageError> {
        self.cache.delete(&url_cache_key(path)).await?;
        self.cache.delete(&preview_cache_key(path)).await?;
        debug!(path = %path, "evicted cached urls");
        Ok(())
    }
}

#[async_trait]
impl Storage for CacheStorage {
    fn storage_type(&self) -> StorageType {
        self.inner.storage_type()
    }

    async fn upload(
        &self,
        reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
    ) -> Result<StoredObject, StorageError> {
        self.inner.upload(reader, filename, size, folder_path).await
    }

    async fn upload_buffered(
        &self,
        reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
        buf: &mut [u8],
    ) -> Result<StoredObject, StorageError> {
        self.inner
            .upload_buffered(reader, filename, size, folder_path, buf)
            .await
    }

    async fn delete(&self, file: &File) -> Result<(), StorageError> {
        self.evict(&file.path).await?;
        self.inner.delete(file).await
    }

    async fn move_object(&self, file: &File, old_path: &str) -> Result<(), StorageError> {
        self.evict(old_path).await?;
        self.evict(&file.path).await?;
        self.inner.move_object(file, old_path).await
    }

    async fn get_url(&self, file: &File) -> Result<String, StorageError> {
        let key = url_cache_key(&file.path);
        if let Some(url) = self.cached(&key).await {
            return Ok(url);
        }
        let url = self.inner.get_url(file).await?;
        self.remember(&key, &url).await;
        Ok(url)
    }

    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError> {
        let key = preview_cache_key(&file.path);
        if let Some(url) = self.cached(&key).await {
            return Ok(url);
        }
        let url = self.inner.get_preview_url(file).await?;
        self.remember(&key, &url).await;
        Ok(url)
    }

    async fn download(&self, file: &File) -> Result<ByteStream, StorageError> {
        self.inner.download(file).await
    }
}
