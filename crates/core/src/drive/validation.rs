//! Validation rules for files, folders, and shares.
//!
//! All checks run before any backend call so a rejected request has no
//! side effects.

use super::error::DriveError;
use super::types::{File, FileShare, Folder, RECYCLE_PREFIX, extension_of, is_root};

/// Maximum length of a file or folder name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a file type or filename extension, in characters.
pub const MAX_FILE_TYPE_LEN: usize = 32;

/// Characters that would break a path on at least one backend.
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a file or folder name.
///
/// # Errors
///
/// Returns `InvalidInput` for empty, over-long, or path-breaking names.
pub fn validate_name(kind: &str, name: &str) -> Result<(), DriveError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DriveError::invalid_input(format!("{kind} name is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DriveError::invalid_input(format!(
            "{kind} name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return Err(DriveError::invalid_input(format!(
            "{kind} name contains forbidden character {c:?}"
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(DriveError::invalid_input(format!(
            "{kind} name cannot be a relative path segment"
        )));
    }
    Ok(())
}

/// Validate a file about to be persisted.
///
/// # Errors
///
/// Returns `InvalidInput` describing the first violated rule.
pub fn validate_file(file: &File) -> Result<(), DriveError> {
    validate_name("file", &file.name)?;
    if file.size == 0 {
        return Err(DriveError::invalid_input("file size must be greater than 0"));
    }
    if file.file_type.chars().any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_whitespace()) {
        return Err(DriveError::invalid_input(format!(
            "file type {:?} contains forbidden characters",
            file.file_type
        )));
    }
    if file.file_type.chars().count() > MAX_FILE_TYPE_LEN {
        return Err(DriveError::invalid_input(format!(
            "file type exceeds {MAX_FILE_TYPE_LEN} characters"
        )));
    }
    // The extension is carried into the generated object name
    if extension_of(&file.name).chars().count() > MAX_FILE_TYPE_LEN {
        return Err(DriveError::invalid_input(format!(
            "file extension exceeds {MAX_FILE_TYPE_LEN} characters"
        )));
    }
    if file.folder_id.is_empty() {
        return Err(DriveError::invalid_input("folder id is required"));
    }
    if file.is_deleted == file.original_path.is_empty() {
        return Err(DriveError::invalid_input(
            "recycle flag and original path disagree",
        ));
    }
    Ok(())
}

/// Validate a folder about to be persisted.
///
/// # Errors
///
/// Returns `InvalidInput` describing the first violated rule.
pub fn validate_folder(folder: &Folder) -> Result<(), DriveError> {
    validate_name("folder", &folder.name)?;
    if folder.parent_id.is_empty() {
        return Err(DriveError::invalid_input("parent id is required"));
    }
    if folder.parent_id == folder.id {
        return Err(DriveError::invalid_move("a folder cannot be its own parent"));
    }
    // A root folder with this name would share keys with recycled objects
    if is_root(&folder.parent_id) && folder.name.trim().eq_ignore_ascii_case(RECYCLE_PREFIX) {
        return Err(DriveError::invalid_input(format!(
            "{RECYCLE_PREFIX:?} is reserved at the root"
        )));
    }
    Ok(())
}

/// Validate a share about to be persisted.
///
/// # Errors
///
/// Returns `InvalidInput` describing the first violated rule.
pub fn validate_share(share: &FileShare) -> Result<(), DriveError> {
    if share.file_id.is_empty() {
        return Err(DriveError::invalid_input("file id is required"));
    }
    if share.share_code.is_empty() {
        return Err(DriveError::invalid_input("share code is required"));
    }
    if share.expire_time <= 0 {
        return Err(DriveError::invalid_input("expire time must be greater than 0"));
    }
    Ok(())
}
