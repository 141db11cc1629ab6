//! Pooled buffers for streamed uploads and downloads.

use std::sync::Arc;

use async_trait::async_trait;

use crate::drive::File;
use crate::storage::capability::Storage;
use crate::storage::error::StorageError;
use crate::storage::pool::{BufferPool, PooledReader};
use crate::storage::types::{ByteStream, StorageType, StoredObject};

/// Lends buffers from a shared [`BufferPool`] to the wrapped backend.
///
/// Uploads hand the inner backend a pooled staging buffer. Downloads are
/// read through a pooled buffer. A buffer goes back to the pool when the
/// upload returns or the download stream is dropped, whether the transfer
/// finished or failed.
pub struct PoolStorage {
    inner: Arc<dyn Storage>,
    pool: Arc<BufferPool>,
}

impl PoolStorage {
    /// Wrap `inner`, borrowing buffers from `pool`.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>, pool: Arc<BufferPool>) -> Self {
        Self { inner, pool }
    }
}

#[async_trait]
impl Storage for PoolStorage {
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
        let mut buf = self.pool.acquire();
        self.inner
            .upload_buffered(reader, filename, size, folder_path, &mut buf)
            .await
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
        self.inner.delete(file).await
    }

    async fn move_object(&self, file: &File, old_path: &str) -> Result<(), StorageError> {
        self.inner.move_object(file, old_path).await
    }

    async fn get_url(&self, file: &File) -> Result<String, StorageError> {
        self.inner.get_url(file).await
    }

    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError> {
        self.inner.get_preview_url(file).await
    }

    async fn download(&self, file: &File) -> Result<ByteStream, StorageError> {
        let stream = self.inner.download(file).await?;
        Ok(PooledReader::boxed(stream, &self.pool))
    }
}
