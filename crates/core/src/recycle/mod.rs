//! Recycle bin retention.
//!
//! Recycled files are kept for a retention period and then purged by a
//! background [`RecycleCleaner`]. Purging removes the backend object first
//! and the row second, exactly like a manual permanent delete.

mod cleaner;

pub use cleaner::{CleanupReport, RecycleCleaner};
