//! Persistence contracts for files, folders, and shares.
//!
//! These traits are implemented by the db crate to provide actual database
//! operations. Single-row creates and updates are expected to be atomic.

use std::future::Future;

use chrono::{DateTime, Utc};
use stowage_shared::types::PageRequest;

use super::error::DriveError;
use super::types::{File, FileFilter, FileShare, Folder, FolderFilter};

/// Repository trait for file rows.
pub trait FileRepository: Send + Sync {
    /// Insert a new file row.
    fn create_file(&self, file: &File) -> impl Future<Output = Result<File, DriveError>> + Send;

    /// Overwrite an existing file row.
    fn update_file(&self, file: &File) -> impl Future<Output = Result<File, DriveError>> + Send;

    /// Remove a file row. Returns `false` if no row matched.
    fn delete_file(&self, id: &str) -> impl Future<Output = Result<bool, DriveError>> + Send;

    /// Find a file by ID.
    fn get_file(&self, id: &str)
    -> impl Future<Output = Result<Option<File>, DriveError>> + Send;

    /// List files matching the filter, returning the page and the total count.
    fn list_files(
        &self,
        filter: &FileFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<File>, u64), DriveError>> + Send;

    /// Recycled files whose `deleted_at` is strictly before `before`.
    fn get_expired_recycle_files(
        &self,
        before: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<File>, DriveError>> + Send;
}

/// Repository trait for folder rows.
pub trait FolderRepository: Send + Sync {
    /// Insert a new folder row.
    fn create_folder(
        &self,
        folder: &Folder,
    ) -> impl Future<Output = Result<Folder, DriveError>> + Send;

    /// Overwrite an existing folder row.
    fn update_folder(
        &self,
        folder: &Folder,
    ) -> impl Future<Output = Result<Folder, DriveError>> + Send;

    /// Remove a folder row. Returns `false` if no row matched.
    fn delete_folder(&self, id: &str) -> impl Future<Output = Result<bool, DriveError>> + Send;

    /// Find a folder by ID.
    fn get_folder(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Folder>, DriveError>> + Send;

    /// List folders matching the filter, returning the page and the total count.
    fn list_folders(
        &self,
        filter: &FolderFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<Folder>, u64), DriveError>> + Send;
}

/// Repository trait for share rows.
pub trait ShareRepository: Send + Sync {
    /// Insert a new share row.
    fn create_file_share(
        &self,
        share: &FileShare,
    ) -> impl Future<Output = Result<FileShare, DriveError>> + Send;

    /// Find a share by its code.
    fn get_file_share(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<FileShare>, DriveError>> + Send;
}

/// Everything the drive service needs from persistence.
pub trait DriveRepository: FileRepository + FolderRepository + ShareRepository {}

impl<T> DriveRepository for T where T: FileRepository + FolderRepository + ShareRepository {}
