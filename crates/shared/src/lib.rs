//! Shared types, errors, and configuration for Stowage.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for list queries
//! - Application-wide error type with stable reason codes
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
