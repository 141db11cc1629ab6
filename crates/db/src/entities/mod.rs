//! `SeaORM` entity definitions.

pub mod file_shares;
pub mod files;
pub mod folders;
