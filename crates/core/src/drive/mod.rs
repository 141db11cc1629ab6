//! Files, folders, and shares.
//!
//! This module provides:
//! - Domain types and their validation rules
//! - Repository contracts implemented by the db crate
//! - [`DriveService`], which owns every multi-step operation
//!
//! # File lifecycle
//!
//! ```text
//!            upload                recycle
//!   (none) ─────────▶ Active ◀──────────────▶ Recycled
//!                       │        restore         │
//!                       │ delete                 │ delete / cleaner
//!                       ▼                        ▼
//!                    Purged ◀────────────────────┘
//! ```

mod error;
mod password;
mod repository;
mod service;
mod types;
mod validation;

#[cfg(test)]
pub(crate) mod memory;


pub use error::DriveError;
pub use password::{
    PasswordError, SHARE_CODE_LEN, generate_share_code, hash_password, verify_password,
};
pub use repository::{DriveRepository, FileRepository, FolderRepository, ShareRepository};
pub use service::DriveService;
pub use types::{
    CreateFolderInput, File, FileFilter, FileShare, FileState, Folder, FolderFilter,
    RECYCLE_PREFIX, ROOT_FOLDER_ID, ShareFileInput, UploadFileInput, extension_of, is_root,
    join_key, new_id,
};
pub use validation::{
    FORBIDDEN_CHARS, MAX_NAME_LEN, validate_file, validate_folder, validate_name, validate_share,
};
