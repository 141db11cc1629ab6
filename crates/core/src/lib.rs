//! Core storage and file lifecycle logic for Stowage.
//!
//! This crate contains the storage engine with ZERO web or database dependencies.
//! Persistence, caching, and metrics are reached through traits that other
//! crates (or tests) implement.
//!
//! # Modules
//!
//! - `storage` - Backend drivers, decorators, and the storage factory
//! - `drive` - File/folder/share domain model and the lifecycle service
//! - `recycle` - Background purge of expired recycle-bin entries

pub mod drive;
pub mod recycle;
pub mod storage;
