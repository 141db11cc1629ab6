//! In-memory repository for service and cleaner tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use stowage_shared::types::PageRequest;

use super::error::DriveError;
use super::repository::{FileRepository, FolderRepository, ShareRepository};
use super::types::{File, FileFilter, FileShare, Folder, FolderFilter};

#[derive(Default)]
pub struct MemoryRepository {
    files: Mutex<HashMap<String, File>>,
    folders: Mutex<HashMap<String, Folder>>,
    shares: Mutex<HashMap<String, FileShare>>,
    fail_file_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make file creates and updates fail until switched off.
    pub fn fail_file_writes(&self, fail: bool) {
        self.fail_file_writes.store(fail, Ordering::SeqCst);
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Insert or overwrite a folder row directly.
    pub fn put_folder(&self, folder: Folder) {
        self.folders.lock().unwrap().insert(folder.id.clone(), folder);
    }

    /// Insert or overwrite a file row directly.
    pub fn put_file(&self, file: File) {
        self.files.lock().unwrap().insert(file.id.clone(), file);
    }

    fn check_writable(&self) -> Result<(), DriveError> {
        if self.fail_file_writes.load(Ordering::SeqCst) {
            Err(DriveError::repository("injected write failure"))
        } else {
            Ok(())
        }
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let page_items = items.into_iter().skip(offset).take(limit).collect();
    (page_items, total)
}

impl FileRepository for MemoryRepository {
    async fn create_file(&self, file: &File) -> Result<File, DriveError> {
        self.check_writable()?;
        self.put_file(file.clone());
        Ok(file.clone())
    }

    async fn update_file(&self, file: &File) -> Result<File, DriveError> {
        self.check_writable()?;
        let mut files = self.files.lock().unwrap();
        if !files.contains_key(&file.id) {
            return Err(DriveError::FileNotFound(file.id.clone()));
        }
        files.insert(file.id.clone(), file.clone());
        Ok(file.clone())
    }

    async fn delete_file(&self, id: &str) -> Result<bool, DriveError> {
        Ok(self.files.lock().unwrap().remove(id).is_some())
    }

    async fn get_file(&self, id: &str) -> Result<Option<File>, DriveError> {
        Ok(self.files.lock().unwrap().get(id).cloned())
    }

    async fn list_files(
        &self,
        filter: &FileFilter,
        page: PageRequest,
    ) -> Result<(Vec<File>, u64), DriveError> {
        let mut matching: Vec<File> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn get_expired_recycle_files(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<File>, DriveError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.is_deleted && f.deleted_at.is_some_and(|at| at < before))
            .cloned()
            .collect())
    }
}

impl FolderRepository for MemoryRepository {
    async fn create_folder(&self, folder: &Folder) -> Result<Folder, DriveError> {
        self.put_folder(folder.clone());
        Ok(folder.clone())
    }

    async fn update_folder(&self, folder: &Folder) -> Result<Folder, DriveError> {
        let mut folders = self.folders.lock().unwrap();
        if !folders.contains_key(&folder.id) {
            return Err(DriveError::FolderNotFound(folder.id.clone()));
        }
        folders.insert(folder.id.clone(), folder.clone());
        Ok(folder.clone())
    }

    async fn delete_folder(&self, id: &str) -> Result<bool, DriveError> {
        Ok(self.folders.lock().unwrap().remove(id).is_some())
    }

    async fn get_folder(&self, id: &str) -> Result<Option<Folder>, DriveError> {
        Ok(self.folders.lock().unwrap().get(id).cloned())
    }

    async fn list_folders(
        &self,
        filter: &FolderFilter,
        page: PageRequest,
    ) -> Result<(Vec<Folder>, u64), DriveError> {
        let mut matching: Vec<Folder> = self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }
}

impl ShareRepository for MemoryRepository {
    async fn create_file_share(&self, share: &FileShare) -> Result<FileShare, DriveError> {
        let mut shares = self.shares.lock().unwrap();
        if shares.contains_key(&share.share_code) {
            return Err(DriveError::repository("duplicate share code"));
        }
        shares.insert(share.share_code.clone(), share.clone());
        Ok(share.clone())
    }

    async fn get_file_share(&self, code: &str) -> Result<Option<FileShare>, DriveError> {
        Ok(self.shares.lock().unwrap().get(code).cloned())
    }
}
