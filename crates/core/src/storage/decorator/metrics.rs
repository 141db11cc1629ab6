//! Duration and error instrumentation.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::drive::File;
use crate::storage::capability::Storage;
use crate::storage::error::StorageError;
use crate::storage::metrics::MetricsSink;
use crate::storage::types::{ByteStream, StorageOperation, StorageType, StoredObject};

/// Records the duration of every call and counts failures, tagged by
/// storage type and operation. Results pass through unchanged.
pub struct MetricsStorage {
    inner: Arc<dyn Storage>,
    sink: Arc<dyn MetricsSink>,
}

impl MetricsStorage {
    /// Wrap `inner`, reporting to `sink`.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { inner, sink }
    }

    async fn observe<T, F>(&self, op: StorageOperation, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>> + Send,
    {
        let storage_type = self.inner.storage_type();
        let start = Instant::now();
        let result = call.await;
        self.sink
            .observe_duration(storage_type, op, start.elapsed().as_secs_f64());
        if result.is_err() {
            self.sink.increment_error(storage_type, op);
        }
        result
    }
}

#[async_trait]
impl Storage for MetricsStorage {
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
        self.observe(
            StorageOperation::Upload,
            self.inner.upload(reader, filename, size, folder_path),
        )
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
        self.observe(
            StorageOperation::Upload,
            self.inner
                .upload_buffered(reader, filename, size, folder_path, buf),
        )
        .await
    }

    async fn delete(&self, file: &File) -> Result<(), StorageError> {
        self.observe(StorageOperation::Delete, self.inner.delete(file))
            .await
    }

    async fn move_object(&self, file: &File, old_path: &str) -> Result<(), StorageError> {
        self.observe(StorageOperation::Move, self.inner.move_object(file, old_path))
            .await
    }

    async fn get_url(&self, file: &File) -> Result<String, StorageError> {
        self.observe(StorageOperation::GetUrl, self.inner.get_url(file))
            .await
    }

    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError> {
        self.observe(
            StorageOperation::GetPreviewUrl,
            self.inner.get_preview_url(file),
        )
        .await
    }

    async fn download(&self, file: &File) -> Result<ByteStream, StorageError> {
        self.observe(StorageOperation::Download, self.inner.download(file))
            .await
    }
}
