//! Storage decorators.
//!
//! Each decorator wraps any [`Storage`](super::Storage) and implements the
//! same capability, so they stack in any order. The factory builds
//! `Cache(Metrics(Pool(driver)))`: cache hits never reach the metrics layer,
//! and the metrics layer times the pooled I/O the driver actually performs.

mod cache;
mod metrics;
mod pool;

pub use cache::{CacheStorage, preview_cache_key, url_cache_key};
pub use metrics::MetricsStorage;
pub use pool::PoolStorage;
