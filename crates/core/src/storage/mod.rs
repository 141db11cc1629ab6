//! Backend-agnostic object storage using Apache OpenDAL.
//!
//! This module provides one [`Storage`] capability with four backends:
//! - Local filesystem
//! - S3-compatible: AWS S3, MinIO, Cloudflare R2
//! - Aliyun OSS
//! - Tencent COS
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ StorageFactory::get_storage(type)                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ CacheStorage    cache:url:{path} / cache:preview:{path}         │
//! │ MetricsStorage  duration + errors per (storage_type, operation) │
//! │ PoolStorage     pooled buffers for upload/download streams      │
//! │ OpendalStorage  local │ s3 │ oss │ cos                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod cache;
mod capability;
mod config;
mod decorator;
mod error;
mod factory;
mod metrics;
mod pool;
mod preview;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AccessUrl, OpendalStorage, Relocation};
pub use cache::{KvCache, MokaKvCache};
pub use capability::Storage;
pub use config::{
    BufferPoolConfig, CosConfig, LocalConfig, OssConfig, S3Config, StorageConfig,
};
pub use decorator::{
    CacheStorage, MetricsStorage, PoolStorage, preview_cache_key, url_cache_key,
};
pub use error::StorageError;
pub use factory::StorageFactory;
pub use metrics::{InMemoryMetrics, MetricsSink, OperationStats};
pub use pool::{BufferPool, PooledBuffer, PooledReader};
pub use preview::{DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS, PreviewKind, classify as classify_preview};
pub use types::{ByteStream, StorageOperation, StorageType, StoredObject};
