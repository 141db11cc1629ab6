//! Drive service: file and folder lifecycle over storage and persistence.
//!
//! Every multi-step operation mutates the backend first and persists the
//! row second. Validation always runs before the first backend call.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use stowage_shared::types::{PageRequest, PageResponse};
use tracing::{debug, error, info, warn};

use super::error::DriveError;
use super::password::{generate_share_code, hash_password, verify_password};
use super::repository::DriveRepository;
use super::types::{
    CreateFolderInput, File, FileFilter, FileShare, Folder, FolderFilter, ROOT_FOLDER_ID,
    ShareFileInput, UploadFileInput, extension_of, is_root, join_key, new_id,
};
use super::validation::{validate_file, validate_folder, validate_name, validate_share};
use crate::storage::{ByteStream, Storage, StorageFactory};

/// Attempts at drawing an unused share code before giving up.
const MAX_SHARE_CODE_ATTEMPTS: usize = 5;

/// Orchestrates validation, backend I/O, and persistence for drive entities.
///
/// Stateless apart from its collaborators; safe to share across tasks.
pub struct DriveService<R: DriveRepository> {
    storage: Arc<StorageFactory>,
    repo: Arc<R>,
}

impl<R: DriveRepository> DriveService<R> {
    /// Create a new drive service.
    #[must_use]
    pub fn new(storage: Arc<StorageFactory>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// The storage factory in use.
    #[must_use]
    pub fn storage(&self) -> &Arc<StorageFactory> {
        &self.storage
    }

    /// The repository in use.
    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Upload a file into a folder.
    ///
    /// If persisting the row fails after the object was written, the object
    /// is deleted again so the upload is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name or size is invalid
    /// - The target folder does not exist
    /// - The backend write or the row insert fails
    pub async fn upload_file(
        &self,
        input: UploadFileInput,
        reader: ByteStream,
    ) -> Result<File, DriveError> {
        let folder_id = normalize_folder_id(&input.folder_id);
        let folder_path = self.folder_path(&folder_id).await?;

        let now = Utc::now();
        let mut file = File {
            id: new_id(),
            file_type: input
                .file_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| extension_of(&input.name)),
            name: input.name,
            generated_name: String::new(),
            path: String::new(),
            original_path: String::new(),
            folder_id,
            size: input.size,
            storage_type: self.storage.config().current_type()?,
            url: String::new(),
            tenant_id: input.tenant_id,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_by: None,
            deleted_at: None,
        };
        validate_file(&file)?;

        let storage = self.storage.get_storage(file.storage_type)?;
        let stored = storage
            .upload(reader, &file.name, file.size, &folder_path)
            .await?;
        file.generated_name = stored.generated_name;
        file.path = stored.path;
        file.url = stored.url;
        file.size = stored.size;

        match self.repo.create_file(&file).await {
            Ok(created) => {
                info!(
                    file_id = %created.id,
                    path = %created.path,
                    storage_type = %created.storage_type,
                    size = created.size,
                    "file uploaded"
                );
                Ok(created)
            }
            Err(err) => {
                warn!(path = %file.path, error = %err, "persisting upload failed, removing object");
                if let Err(cleanup_err) = storage.delete(&file).await {
                    error!(
                        path = %file.path,
                        error = %cleanup_err,
                        "failed to remove orphaned upload"
                    );
                }
                Err(err)
            }
        }
    }

    /// Find a file by ID.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if no row matches.
    pub async fn get_file(&self, id: &str) -> Result<File, DriveError> {
        self.repo
            .get_file(id)
            .await?
            .ok_or_else(|| DriveError::FileNotFound(id.to_string()))
    }

    /// List files matching a filter.
    pub async fn list_files(
        &self,
        filter: &FileFilter,
        page: PageRequest,
    ) -> Result<PageResponse<File>, DriveError> {
        let (files, total) = self.repo.list_files(filter, page).await?;
        Ok(PageResponse::new(files, page, total))
    }

    /// List recycle-bin entries, optionally for one tenant.
    pub async fn list_recycle_bin(
        &self,
        tenant_id: Option<&str>,
        page: PageRequest,
    ) -> Result<PageResponse<File>, DriveError> {
        let filter = FileFilter {
            tenant_id: tenant_id.map(ToString::to_string),
            ..FileFilter::recycled()
        };
        self.list_files(&filter, page).await
    }

    /// Access URL of a file.
    pub async fn get_file_url(&self, id: &str) -> Result<String, DriveError> {
        let file = self.get_file(id).await?;
        let storage = self.storage_for(&file)?;
        Ok(storage.get_url(&file).await?)
    }

    /// Preview URL of a file.
    ///
    /// # Errors
    ///
    /// Returns a backend error mapped to `INVALID_INPUT` when the file type
    /// cannot be previewed.
    pub async fn get_file_preview_url(&self, id: &str) -> Result<String, DriveError> {
        let file = self.get_file(id).await?;
        let storage = self.storage_for(&file)?;
        Ok(storage.get_preview_url(&file).await?)
    }

    /// Open a file for reading. The caller owns the returned stream.
    pub async fn download_file(&self, id: &str) -> Result<(File, ByteStream), DriveError> {
        let file = self.get_file(id).await?;
        let storage = self.storage_for(&file)?;
        let stream = storage.download(&file).await?;
        Ok((file, stream))
    }

    /// Move an active file into another folder.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file or target folder does not exist
    /// - The file is in the recycle bin
    /// - The backend move or the row update fails
    pub async fn move_file(&self, id: &str, target_folder_id: &str) -> Result<File, DriveError> {
        let file = self.get_file(id).await?;
        if file.is_deleted {
            return Err(DriveError::invalid_operation(format!(
                "file {id} is in the recycle bin"
            )));
        }

        let target = normalize_folder_id(target_folder_id);
        let target_path = self.folder_path(&target).await?;
        if file.folder_id == target {
            return Ok(file);
        }

        let mut moved = file.clone();
        moved.folder_id = target;
        moved.path = join_key(&target_path, &file.generated_name);
        moved.updated_at = Utc::now();
        validate_file(&moved)?;

        self.relocate(&file, moved, "move").await
    }

    /// Move a file into the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the file is already recycled.
    pub async fn recycle_file(&self, id: &str, deleted_by: &str) -> Result<File, DriveError> {
        let file = self.get_file(id).await?;
        if file.is_deleted {
            return Err(DriveError::invalid_operation(format!(
                "file {id} is already in the recycle bin"
            )));
        }

        let mut recycled = file.clone();
        recycled.mark_recycled(deleted_by, Utc::now());
        validate_file(&recycled)?;

        self.relocate(&file, recycled, "recycle").await
    }

    /// Bring a file back from the recycle bin to its original location.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the file is not in the recycle bin.
    pub async fn restore_file(&self, id: &str) -> Result<File, DriveError> {
        let file = self.get_file(id).await?;
        if !file.is_deleted {
            return Err(DriveError::invalid_operation(format!(
                "file {id} is not in the recycle bin"
            )));
        }

        let mut restored = file.clone();
        restored.mark_restored(Utc::now());
        validate_file(&restored)?;

        self.relocate(&file, restored, "restore").await
    }

    /// Permanently delete a file: backend object first, then the row.
    pub async fn delete_file(&self, id: &str) -> Result<(), DriveError> {
        let file = self.get_file(id).await?;
        self.purge_file(&file).await
    }

    /// Permanently delete an already-loaded file.
    pub async fn purge_file(&self, file: &File) -> Result<(), DriveError> {
        let storage = self.storage_for(file)?;
        storage.delete(file).await?;

        if !self.repo.delete_file(&file.id).await? {
            warn!(file_id = %file.id, "file row already gone after object delete");
        }
        info!(file_id = %file.id, path = %file.path, "file deleted");
        Ok(())
    }

    /// Delete files one by one, stopping at the first failure.
    ///
    /// Files deleted before the failure stay deleted.
    pub async fn batch_delete_files(&self, ids: &[String]) -> Result<(), DriveError> {
        for id in ids {
            self.delete_file(id).await?;
        }
        Ok(())
    }

    /// Move files one by one, stopping at the first failure.
    ///
    /// Files moved before the failure stay moved.
    pub async fn batch_move_files(
        &self,
        ids: &[String],
        target_folder_id: &str,
    ) -> Result<Vec<File>, DriveError> {
        let mut moved = Vec::with_capacity(ids.len());
        for id in ids {
            moved.push(self.move_file(id, target_folder_id).await?);
        }
        Ok(moved)
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    /// Create an empty folder.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is invalid
    /// - The parent does not exist
    /// - A sibling already uses the name
    pub async fn create_folder(&self, input: CreateFolderInput) -> Result<Folder, DriveError> {
        validate_name("folder", &input.name)?;
        let parent_id = normalize_folder_id(&input.parent_id);
        let parent_path = self.folder_path(&parent_id).await?;
        self.ensure_unique_name(&parent_id, &input.name, &input.tenant_id, None)
            .await?;

        let now = Utc::now();
        let folder = Folder {
            id: new_id(),
            path: join_key(&parent_path, &input.name),
            name: input.name,
            parent_id,
            tenant_id: input.tenant_id,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        validate_folder(&folder)?;

        let created = self.repo.create_folder(&folder).await?;
        info!(folder_id = %created.id, parent_id = %created.parent_id, "folder created");
        Ok(created)
    }

    /// Rename a folder. Its object key prefix does not change.
    pub async fn rename_folder(&self, id: &str, name: &str) -> Result<Folder, DriveError> {
        validate_name("folder", name)?;
        let folder = self.get_folder(id).await?;
        if folder.name == name {
            return Ok(folder);
        }
        self.ensure_unique_name(&folder.parent_id, name, &folder.tenant_id, Some(id))
            .await?;

        let mut renamed = folder;
        renamed.name = name.to_string();
        renamed.updated_at = Utc::now();
        validate_folder(&renamed)?;

        let updated = self.repo.update_folder(&renamed).await?;
        debug!(folder_id = %updated.id, name = %updated.name, "folder renamed");
        Ok(updated)
    }

    /// Find a folder by ID.
    ///
    /// # Errors
    ///
    /// Returns `FolderNotFound` if no row matches.
    pub async fn get_folder(&self, id: &str) -> Result<Folder, DriveError> {
        self.repo
            .get_folder(id)
            .await?
            .ok_or_else(|| DriveError::FolderNotFound(id.to_string()))
    }

    /// List folders matching a filter.
    pub async fn list_folders(
        &self,
        filter: &FolderFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Folder>, DriveError> {
        let (folders, total) = self.repo.list_folders(filter, page).await?;
        Ok(PageResponse::new(folders, page, total))
    }

    /// Delete an empty folder.
    ///
    /// Recycled files still count as content, since restoring them needs
    /// the folder.
    ///
    /// # Errors
    ///
    /// Returns `FolderNotEmpty` if the folder owns any file or subfolder.
    pub async fn delete_folder(&self, id: &str) -> Result<(), DriveError> {
        let folder = self.get_folder(id).await?;

        let file_filter = FileFilter {
            folder_id: Some(folder.id.clone()),
            ..FileFilter::default()
        };
        let (_, file_count) = self
            .repo
            .list_files(&file_filter, PageRequest::count_only())
            .await?;
        let (_, folder_count) = self
            .repo
            .list_folders(&FolderFilter::children_of(&folder.id), PageRequest::count_only())
            .await?;
        if file_count > 0 || folder_count > 0 {
            return Err(DriveError::FolderNotEmpty(format!(
                "{id} has {file_count} files and {folder_count} subfolders"
            )));
        }

        self.repo.delete_folder(id).await?;
        info!(folder_id = %id, "folder deleted");
        Ok(())
    }

    /// Move a folder under another parent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMove` if the target is the folder itself or one of
    /// its descendants, and `FolderNotFound` if either folder is missing.
    pub async fn move_folder(&self, id: &str, target_parent_id: &str) -> Result<Folder, DriveError> {
        let folder = self.get_folder(id).await?;
        let target = normalize_folder_id(target_parent_id);
        if target == folder.id {
            return Err(DriveError::invalid_move(format!(
                "folder {id} cannot be moved into itself"
            )));
        }
        self.ensure_not_descendant(&folder.id, &target).await?;
        if folder.parent_id == target {
            return Ok(folder);
        }
        self.ensure_unique_name(&target, &folder.name, &folder.tenant_id, Some(id))
            .await?;

        let mut moved = folder;
        moved.parent_id = target;
        moved.updated_at = Utc::now();
        validate_folder(&moved)?;

        let updated = self.repo.update_folder(&moved).await?;
        info!(folder_id = %updated.id, parent_id = %updated.parent_id, "folder moved");
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Shares
    // ------------------------------------------------------------------

    /// Share an active file under a fresh share code.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or is recycled
    /// - The expiry is not positive
    /// - No unused share code could be drawn
    pub async fn share_file(&self, input: ShareFileInput) -> Result<FileShare, DriveError> {
        let file = self.get_file(&input.file_id).await?;
        if file.is_deleted {
            return Err(DriveError::invalid_operation(format!(
                "file {} is in the recycle bin",
                file.id
            )));
        }

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => hash_password(password)?,
            _ => String::new(),
        };

        let share = FileShare {
            id: new_id(),
            file_id: file.id,
            share_code: self.unused_share_code().await?,
            password_hash,
            expire_time: input.expire_time,
            created_by: input.created_by,
            created_at: Utc::now(),
        };
        validate_share(&share)?;

        let created = self.repo.create_file_share(&share).await?;
        info!(
            file_id = %created.file_id,
            expire_time = created.expire_time,
            "file shared"
        );
        Ok(created)
    }

    /// Resolve a share code to its file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code is unknown (`ShareNotFound`)
    /// - The share has expired (`ShareExpired`)
    /// - A password is set and the supplied one is missing or wrong
    /// - The file has since been purged or recycled (`FileNotFound`)
    pub async fn get_share_file(
        &self,
        code: &str,
        password: Option<&str>,
    ) -> Result<File, DriveError> {
        let share = self
            .repo
            .get_file_share(code)
            .await?
            .ok_or_else(|| DriveError::ShareNotFound(code.to_string()))?;

        if share.is_expired(Utc::now()) {
            return Err(DriveError::ShareExpired(code.to_string()));
        }
        if share.has_password() {
            let supplied = password.unwrap_or_default();
            if supplied.is_empty() || !verify_password(supplied, &share.password_hash)? {
                return Err(DriveError::SharePasswordIncorrect);
            }
        }

        match self.repo.get_file(&share.file_id).await? {
            Some(file) if !file.is_deleted => Ok(file),
            _ => Err(DriveError::FileNotFound(share.file_id)),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn storage_for(&self, file: &File) -> Result<Arc<dyn Storage>, DriveError> {
        Ok(self.storage.get_storage(file.storage_type)?)
    }

    /// Key prefix of a folder, empty for root.
    async fn folder_path(&self, folder_id: &str) -> Result<String, DriveError> {
        if is_root(folder_id) {
            return Ok(String::new());
        }
        Ok(self.get_folder(folder_id).await?.path)
    }

    /// Move the object of `before` to the path of `after`, then persist
    /// `after`.
    async fn relocate(&self, before: &File, after: File, action: &str) -> Result<File, DriveError> {
        let storage = self.storage_for(before)?;
        storage.move_object(&after, &before.path).await?;

        match self.repo.update_file(&after).await {
            Ok(updated) => {
                info!(
                    file_id = %updated.id,
                    from = %before.path,
                    to = %updated.path,
                    action,
                    "file relocated"
                );
                Ok(updated)
            }
            Err(err) => {
                // Object already moved; the row still points at the old path
                error!(
                    file_id = %before.id,
                    from = %before.path,
                    to = %after.path,
                    action,
                    error = %err,
                    "object moved but row update failed"
                );
                Err(err)
            }
        }
    }

    async fn ensure_unique_name(
        &self,
        parent_id: &str,
        name: &str,
        tenant_id: &str,
        except_id: Option<&str>,
    ) -> Result<(), DriveError> {
        let filter = FolderFilter {
            parent_id: Some(parent_id.to_string()),
            name: Some(name.to_string()),
            tenant_id: Some(tenant_id.to_string()),
        };
        let (siblings, _) = self
            .repo
            .list_folders(&filter, PageRequest::new(1, 2))
            .await?;
        if siblings.iter().any(|f| Some(f.id.as_str()) != except_id) {
            return Err(DriveError::AlreadyExists(format!(
                "{name} already exists in folder {parent_id}"
            )));
        }
        Ok(())
    }

    /// Walk up from `target` to the root; meeting `id` means `target` sits
    /// inside `id`'s subtree.
    async fn ensure_not_descendant(&self, id: &str, target: &str) -> Result<(), DriveError> {
        let mut current = target.to_string();
        let mut visited = HashSet::new();

        while !is_root(&current) {
            if current == id {
                return Err(DriveError::invalid_move(format!(
                    "folder {id} cannot be moved into its own subtree"
                )));
            }
            if !visited.insert(current.clone()) {
                return Err(DriveError::invalid_move(format!(
                    "ancestor chain of {target} loops at {current}"
                )));
            }
            current = self.get_folder(&current).await?.parent_id;
        }
        Ok(())
    }

    async fn unused_share_code(&self) -> Result<String, DriveError> {
        for _ in 0..MAX_SHARE_CODE_ATTEMPTS {
            let code = generate_share_code();
            if self.repo.get_file_share(&code).await?.is_none() {
                return Ok(code);
            }
            debug!("share code collision, drawing again");
        }
        Err(DriveError::repository(format!(
            "no unused share code after {MAX_SHARE_CODE_ATTEMPTS} attempts"
        )))
    }
}

/// Treat an empty folder ID as root.
fn normalize_folder_id(id: &str) -> String {
    if is_root(id) {
        ROOT_FOLDER_ID.to_string()
    } else {
        id.to_string()
    }
}
