//! The storage capability every backend and decorator implements.

use async_trait::async_trait;

use super::error::StorageError;
use super::types::{ByteStream, StorageType, StoredObject};
use crate::drive::File;

/// Object storage for file contents.
///
/// Implementations must be safe for concurrent use. Cancellation is by
/// dropping the returned future; an upload dropped before completion never
/// yields a descriptor, so nothing downstream references a partial write.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend this storage ultimately writes to.
    fn storage_type(&self) -> StorageType;

    /// Write `size` bytes from `reader` as `filename` under `folder_path`.
    ///
    /// Any error means nothing was stored.
    async fn upload(
        &self,
        reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Like [`upload`](Self::upload), but reads `reader` through `buf`
    /// instead of a buffer of the implementation's own.
    ///
    /// The default ignores `buf`.
    async fn upload_buffered(
        &self,
        reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
        buf: &mut [u8],
    ) -> Result<StoredObject, StorageError> {
        let _ = buf;
        self.upload(reader, filename, size, folder_path).await
    }

    /// Remove the object at `file.path`.
    async fn delete(&self, file: &File) -> Result<(), StorageError>;

    /// Relocate the object at `old_path` to `file.path`.
    ///
    /// Never leaves two live copies: if the source cannot be removed after
    /// copying, the copy is removed again.
    async fn move_object(&self, file: &File, old_path: &str) -> Result<(), StorageError>;

    /// Public URL when one is configured, otherwise a signed URL.
    async fn get_url(&self, file: &File) -> Result<String, StorageError>;

    /// Direct URL for images, preview-service URL for office documents.
    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError>;

    /// Open the object for reading from the start.
    async fn download(&self, file: &File) -> Result<ByteStream, StorageError>;
}
