//! File, folder, and share domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StorageType;

/// Parent ID of folders and files that live at the root.
pub const ROOT_FOLDER_ID: &str = "0";

/// Key prefix objects are moved under while recycled.
pub const RECYCLE_PREFIX: &str = "recycle";

/// Returns `true` if the ID names the root folder.
#[must_use]
pub fn is_root(folder_id: &str) -> bool {
    folder_id.is_empty() || folder_id == ROOT_FOLDER_ID
}

/// Generate a new time-ordered entity ID.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Lifecycle state of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Visible in its folder.
    Active,
    /// In the recycle bin, restorable until purged.
    Recycled,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File ID.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Collision-free storage name.
    pub generated_name: String,
    /// Current object key in the backend namespace.
    pub path: String,
    /// Object key before recycling; empty while active.
    pub original_path: String,
    /// Owning folder, `"0"` for root.
    pub folder_id: String,
    /// Size in bytes.
    pub size: u64,
    /// File type, usually the lowercase extension.
    pub file_type: String,
    /// Backend holding the object.
    pub storage_type: StorageType,
    /// Access URL recorded at upload.
    pub url: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Uploader.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Recycle-bin flag.
    pub is_deleted: bool,
    /// Who recycled the file.
    pub deleted_by: Option<String>,
    /// When the file was recycled.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl File {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> FileState {
        if self.is_deleted {
            FileState::Recycled
        } else {
            FileState::Active
        }
    }

    /// Lowercase extension of the original name, without the dot.
    #[must_use]
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    /// Object key the file takes while recycled.
    #[must_use]
    pub fn recycle_path(&self) -> String {
        join_key(RECYCLE_PREFIX, &self.generated_name)
    }

    /// Move the file into the recycle bin.
    ///
    /// Callers must have relocated the object to `recycle_path` first.
    pub fn mark_recycled(&mut self, deleted_by: &str, at: DateTime<Utc>) {
        let recycle_path = self.recycle_path();
        self.original_path = std::mem::replace(&mut self.path, recycle_path);
        self.is_deleted = true;
        self.deleted_by = Some(deleted_by.to_string());
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    /// Bring the file back from the recycle bin.
    ///
    /// Callers must have relocated the object back to `original_path` first.
    pub fn mark_restored(&mut self, at: DateTime<Utc>) {
        self.path = std::mem::take(&mut self.original_path);
        self.is_deleted = false;
        self.deleted_by = None;
        self.deleted_at = None;
        self.updated_at = at;
    }
}

/// A folder in the hierarchy rooted at `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Folder ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent folder, `"0"` for root.
    pub parent_id: String,
    /// Key prefix for objects placed in this folder.
    pub path: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Creator.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A time-limited, optionally password-protected link to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileShare {
    /// Share ID.
    pub id: String,
    /// Shared file.
    pub file_id: String,
    /// Public share token.
    pub share_code: String,
    /// Argon2id hash of the share password; empty when unprotected.
    pub password_hash: String,
    /// Expiry as unix seconds.
    pub expire_time: i64,
    /// Creator.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FileShare {
    /// Returns `true` if the share has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expire_time
    }

    /// Returns `true` if a password is required.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}

/// Input for uploading a file.
#[derive(Debug, Clone)]
pub struct UploadFileInput {
    /// Original filename.
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// File type; derived from the extension when `None`.
    pub file_type: Option<String>,
    /// Target folder, `"0"` for root.
    pub folder_id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Uploader.
    pub created_by: String,
}

/// Input for creating a folder.
#[derive(Debug, Clone)]
pub struct CreateFolderInput {
    /// Display name.
    pub name: String,
    /// Parent folder, `"0"` for root.
    pub parent_id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Creator.
    pub created_by: String,
}

/// Input for sharing a file.
#[derive(Debug, Clone)]
pub struct ShareFileInput {
    /// File to share.
    pub file_id: String,
    /// Optional plaintext password.
    pub password: Option<String>,
    /// Expiry as unix seconds.
    pub expire_time: i64,
    /// Creator.
    pub created_by: String,
}

/// Filter for file listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Restrict to one folder.
    pub folder_id: Option<String>,
    /// Restrict by recycle-bin flag.
    pub is_deleted: Option<bool>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Restrict to one tenant.
    pub tenant_id: Option<String>,
}

impl FileFilter {
    /// Active files inside one folder.
    #[must_use]
    pub fn in_folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(folder_id.into()),
            is_deleted: Some(false),
            ..Self::default()
        }
    }

    /// Files currently in the recycle bin.
    #[must_use]
    pub fn recycled() -> Self {
        Self {
            is_deleted: Some(true),
            ..Self::default()
        }
    }

    /// Returns `true` if the file passes the filter.
    #[must_use]
    pub fn matches(&self, file: &File) -> bool {
        self.folder_id.as_ref().is_none_or(|id| *id == file.folder_id)
            && self.is_deleted.is_none_or(|flag| flag == file.is_deleted)
            && self.tenant_id.as_ref().is_none_or(|t| *t == file.tenant_id)
            && self.name_contains.as_ref().is_none_or(|needle| {
                file.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }
}

/// Filter for folder listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderFilter {
    /// Restrict to children of one folder.
    pub parent_id: Option<String>,
    /// Exact name match.
    pub name: Option<String>,
    /// Restrict to one tenant.
    pub tenant_id: Option<String>,
}

impl FolderFilter {
    /// Children of one folder.
    #[must_use]
    pub fn children_of(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if the folder passes the filter.
    #[must_use]
    pub fn matches(&self, folder: &Folder) -> bool {
        self.parent_id.as_ref().is_none_or(|id| *id == folder.parent_id)
            && self.name.as_ref().is_none_or(|name| *name == folder.name)
            && self.tenant_id.as_ref().is_none_or(|t| *t == folder.tenant_id)
    }
}

/// Lowercase extension of a filename, without the dot.
#[must_use]
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(stem, ext)| if stem.is_empty() { "" } else { ext })
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Join two key segments with a single `/`, skipping empty segments.
#[must_use]
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let name = name.trim_matches('/');
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_file() -> File {
        let now = Utc::now();
        File {
            id: "f1".to_string(),
            name: "report.pdf".to_string(),
            generated_name: "0193a1b2.pdf".to_string(),
            path: "docs/0193a1b2.pdf".to_string(),
            original_path: String::new(),
            folder_id: "docs".to_string(),
            size: 10_240,
            file_type: "pdf".to_string(),
            storage_type: StorageType::Local,
            url: "http://localhost/files/docs/0193a1b2.pdf".to_string(),
            tenant_id: "t1".to_string(),
            created_by: "alice".to_string(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_by: None,
            deleted_at: None,
        }
    }

    #[rstest]
    #[case("report.pdf", "pdf")]
    #[case("Photo.JPG", "jpg")]
    #[case("archive.tar.gz", "gz")]
    #[case("README", "")]
    #[case(".bashrc", "")]
    fn test_extension_of(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(extension_of(name), expected);
    }

    #[rstest]
    #[case("", "a.txt", "a.txt")]
    #[case("docs", "a.txt", "docs/a.txt")]
    #[case("/docs/", "/a.txt", "docs/a.txt")]
    #[case("docs", "", "docs")]
    fn test_join_key(#[case] prefix: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(join_key(prefix, name), expected);
    }

    #[test]
    fn test_recycle_then_restore_round_trips_fields() {
        let mut file = sample_file();
        let before = file.path.clone();

        file.mark_recycled("bob", Utc::now());
        assert_eq!(file.state(), FileState::Recycled);
        assert_eq!(file.original_path, before);
        assert_eq!(file.path, "recycle/0193a1b2.pdf");
        assert_eq!(file.deleted_by.as_deref(), Some("bob"));
        assert!(file.deleted_at.is_some());

        file.mark_restored(Utc::now());
        assert_eq!(file.state(), FileState::Active);
        assert_eq!(file.path, before);
        assert!(file.original_path.is_empty());
        assert!(file.deleted_by.is_none());
        assert!(file.deleted_at.is_none());
    }

    #[test]
    fn test_file_filter_matches() {
        let file = sample_file();
        assert!(FileFilter::in_folder("docs").matches(&file));
        assert!(!FileFilter::in_folder("other").matches(&file));
        assert!(!FileFilter::recycled().matches(&file));

        let by_name = FileFilter {
            name_contains: Some("REPORT".to_string()),
            ..FileFilter::default()
        };
        assert!(by_name.matches(&file));
    }

    #[test]
    fn test_share_expiry() {
        let now = Utc::now();
        let share = FileShare {
            id: "s1".to_string(),
            file_id: "f1".to_string(),
            share_code: "Abc123".to_string(),
            password_hash: String::new(),
            expire_time: now.timestamp() + 60,
            created_by: "alice".to_string(),
            created_at: now,
        };
        assert!(!share.is_expired(now));
        assert!(share.is_expired(now + chrono::Duration::seconds(60)));
        assert!(!share.has_password());
    }

    #[test]
    fn test_root_detection() {
        assert!(is_root("0"));
        assert!(is_root(""));
        assert!(!is_root("a"));
    }
}
