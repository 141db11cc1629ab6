//! Scripted storage used by decorator and factory tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::capability::Storage;
use super::error::StorageError;
use super::types::{ByteStream, StorageOperation, StorageType, StoredObject};
use crate::drive::{File, join_key};

/// Storage that records calls and returns a fresh URL on every lookup.
#[derive(Default)]
pub struct StubStorage {
    calls: Mutex<Vec<StorageOperation>>,
    url_counter: AtomicUsize,
    failing: AtomicBool,
    pub uploaded: Mutex<Vec<u8>>,
}

impl StubStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self, op: StorageOperation) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    fn record(&self, op: StorageOperation) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(op);
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::operation(format!("{op} failed")))
        } else {
            Ok(())
        }
    }

    fn next_url(&self, kind: &str, path: &str) -> String {
        let n = self.url_counter.fetch_add(1, Ordering::SeqCst);
        format!("http://stub/{kind}/{path}?v={n}")
    }
}

#[async_trait]
impl Storage for StubStorage {
    fn storage_type(&self) -> StorageType {
        StorageType::Local
    }

    async fn upload(
        &self,
        mut reader: ByteStream,
        filename: &str,
        size: u64,
        folder_path: &str,
    ) -> Result<StoredObject, StorageError> {
        self.record(StorageOperation::Upload)?;
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        *self.uploaded.lock().unwrap() = body;
        let path = join_key(folder_path, filename);
        Ok(StoredObject {
            generated_name: filename.to_string(),
            url: self.next_url("url", &path),
            path,
            storage_type: StorageType::Local,
            size,
        })
    }

    async fn delete(&self, _file: &File) -> Result<(), StorageError> {
        self.record(StorageOperation::Delete)
    }

    async fn move_object(&self, _file: &File, _old_path: &str) -> Result<(), StorageError> {
        self.record(StorageOperation::Move)
    }

    async fn get_url(&self, file: &File) -> Result<String, StorageError> {
        self.record(StorageOperation::GetUrl)?;
        Ok(self.next_url("url", &file.path))
    }

    async fn get_preview_url(&self, file: &File) -> Result<String, StorageError> {
        self.record(StorageOperation::GetPreviewUrl)?;
        Ok(self.next_url("preview", &file.path))
    }

    async fn download(&self, _file: &File) -> Result<ByteStream, StorageError> {
        self.record(StorageOperation::Download)?;
        let body = self.uploaded.lock().unwrap().clone();
        Ok(Box::pin(std::io::Cursor::new(body)))
    }
}

/// A minimal active file at `path`.
pub fn file_at(path: &str) -> File {
    let now = chrono::Utc::now();
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    File {
        id: crate::drive::new_id(),
        generated_name: name.clone(),
        file_type: crate::drive::extension_of(&name),
        name,
        path: path.to_string(),
        original_path: String::new(),
        folder_id: "0".to_string(),
        size: 1,
        storage_type: StorageType::Local,
        url: String::new(),
        tenant_id: "t1".to_string(),
        created_by: "tester".to_string(),
        created_at: now,
        updated_at: now,
        is_deleted: false,
        deleted_by: None,
        deleted_at: None,
    }
}
