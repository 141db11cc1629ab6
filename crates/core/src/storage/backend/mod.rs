//! Backend drivers built on Apache OpenDAL.
//!
//! Every backend is an [`OpendalStorage`] configured with the way it moves
//! objects and the way it hands out URLs:
//!
//! ```text
//! ┌──────────┬───────────────────────┬──────────────────────────────┐
//! │ backend  │ move                  │ access url                   │
//! ├──────────┼───────────────────────┼──────────────────────────────┤
//! │ local    │ rename                │ base_url + public_path       │
//! │ s3       │ copy, delete, rollback│ public_url or presigned GET  │
//! │ oss      │ copy, delete, rollback│ public_url or presigned GET  │
//! │ cos      │ copy, delete, rollback│ public_url or presigned GET  │
//! └──────────┴───────────────────────┴──────────────────────────────┘
//! ```

mod cos;
mod local;
mod oss;
mod relocate;
mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, Writer};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::capability::Storage;
use super::error::StorageError;
use super::preview;
use super::types::{ByteStream, StorageType, StoredObject};
use crate::drive::{File, extension_of, join_key};

use relocate::relocate;

/// Staging buffer size for uploads that bring no buffer of their own.
const WRITE_CHUNK: usize = 256 * 1024;

/// How a backend moves an object to a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Native rename.
    Rename,
    /// Copy to the new key, delete the old key, roll back the copy if the
    /// delete fails.
    CopyThenDelete,
}

/// How a backend builds access URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessUrl {
    /// Static prefix joined with the object key.
    Public(String),
    /// Signed GET URL valid for the given duration.
    Presigned(Duration),
}

impl AccessUrl {
    /// Public prefix when configured, otherwise signed URLs.
    #[must_use]
    pub fn public_or_presigned(public_url: &str, expiry: Duration) -> Self {
        if public_url.trim().is_empty() {
            Self::Presigned(expiry)
        } else {
            Self::Public(public_url.trim_end_matches('/').to_string())
        }
    }
}

/// A [`Storage`] backend driving an OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OpendalStorage {
    op: Operator,
    storage_type: StorageType,
    relocation: Relocation,
    access: AccessUrl,
    preview_url: String,
}

impl OpendalStorage {
    /// Wrap an already-built operator.
    #[must_use]
    pub fn from_operator(
        op: Operator,
        storage_type: StorageType,
        relocation: Relocation,
        access: AccessUrl,
        preview_url: impl Into<String>,
    ) -> Self {
        Self {
            op,
            storage_type,
            relocation,
            access,
            preview_url: preview_url.into(),
        }
    }

    /// The underlying operator.
    #[must_use]
    pub const fn operator(&self) -> &Operator {
        &self.op
    }

    /// Remove whatever a failed upload left at `path`.
    async fn discard(&self, path: &str) {
        if let Err(err) = self.op.delete(path).await {
            warn!(path = %path, error = %err, "failed to remove unfinished upload");
        }
    }

    async fn access_url(&self, path: &str) -> Result<String, StorageError> {
        match &self.access {
            AccessUrl::Public(base) => Ok(format!("{base}/{path}")),
            AccessUrl::Presigned(expiry) => {
                let signed = self.op.presign_read(path, *expiry).await?;
                Ok(signed.uri().to_string())
            }
        }
    }
}

#[async_trait]
impl Storage for OpendalStorage {
    fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    async fn upload(
        &self,
        reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
    ) -> Result<StoredObject, StorageError> {
        let mut buf = vec![0; WRITE_CHUNK];
        self.upload_buffered(reader, filename, size, folder_path, &mut buf)
            .await
    }

    async fn upload_buffered(
        &self,
        mut reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
        buf: &mut [u8],
    ) -> Result<StoredObject, StorageError> {
        if buf.is_empty() {
            return Err(StorageError::configuration("upload buffer is empty"));
        }
        let generated_name = generate_name(filename);
        let path = join_key(folder_path, &generated_name);

        let mut writer = self.op.writer(&path).await?;
        let written = match write_stream(&mut writer, &mut reader, size, buf).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(path = %path, error = %abort_err, "failed to abort partial upload");
                }
                // Abort does not undo bytes some backends already placed at the key
                self.discard(&path).await;
                return Err(err);
            }
        };
        if let Err(err) = writer.close().await {
            self.discard(&path).await;
            return Err(err.into());
        }

        let url = match self.access_url(&path).await {
            Ok(url) => url,
            Err(err) => {
                self.discard(&path).await;
                return Err(err);
            }
        };
        debug!(
            storage_type = %self.storage_type,
            path = %path,
            size = written,
            "object uploaded"
        );

        Ok(StoredObject {
            generated_name,
            path,
            url,
            storage_type: self.storage_type,
            size: written,
        })
    }

    async fn delete(&self, file: &File) -> Result<(), StorageError> {
        self.op.delete(&file.path).await?;
        debug!(storage_type = %self.storage_type, path = %file.path, "object deleted");
        Ok(())
    }

    async fn move_object(&self, file: &File, old_path: &str) -> Result<(), StorageError> {
        if old_path == file.path {
            return Ok(());
        }
        match self.relocation {
            Relocation::Rename => self.op.rename(old_path, &file.path).await?,
            Relocation::CopyThenDelete => relocate(&self.op, old_path, &file.path).await?,
        }
        debug!(
            storage_type = %self.storage_type,
            from = %old_path,
            to = %file.path,
            "object moved"
        );
        Ok(())
    }

    async fn get_url(&self, file: &File) -> Result<String, StorageError> {
        self.access_url(&file.path).await
    }

    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError> {
        let extension = file.extension();
        preview::classify(&extension)?;
        let access_url = self.access_url(&file.path).await?;
        preview::preview_url(&self.preview_url, &extension, &access_url)
    }

    async fn download(&self, file: &File) -> Result<ByteStream, StorageError> {
        self.op.stat(&file.path).await?;
        let stream = self
            .op
            .reader(&file.path)
            .await?
            .into_bytes_stream(..)
            .await?;
        Ok(Box::pin(StreamReader::new(stream)))
    }
}

/// Stream `reader` into `writer` through `buf`, checking the byte count
/// against `size`.
async fn write_stream(
    writer: &mut Writer,
    reader: &mut ByteStream,
    size: u64,
    buf: &mut [u8],
) -> Result<u64, StorageError> {
    let mut received: u64 = 0;

    loop {
        let n = reader.read(buf).await?;
        if n == 0 {
            break;
        }
        received += n as u64;
        if received > size {
            return Err(StorageError::SizeMismatch {
                declared: size,
                received,
            });
        }
        writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
    }

    if received != size {
        return Err(StorageError::SizeMismatch {
            declared: size,
            received,
        });
    }
    Ok(received)
}

/// Collision-free object name keeping the original extension.
fn generate_name(filename: &str) -> String {
    let id = uuid::Uuid::now_v7().simple().to_string();
    match extension_of(filename).as_str() {
        "" => id,
        ext => format!("{id}.{ext}"),
    }
}

/// Build an operator, mapping construction failures to configuration errors.
fn build_operator<B: opendal::Builder>(builder: B) -> Result<Operator, StorageError> {
    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}

#[cfg(test)]
mod tests;
