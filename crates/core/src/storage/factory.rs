//! Storage factory: resolves, validates, and decorates backends.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::backend::OpendalStorage;
use super::cache::KvCache;
use super::capability::Storage;
use super::config::StorageConfig;
use super::decorator::{CacheStorage, MetricsStorage, PoolStorage};
use super::error::StorageError;
use super::metrics::MetricsSink;
use super::pool::BufferPool;
use super::types::StorageType;

/// Builds decorated storage backends from configuration.
///
/// Backends are built once per type and shared afterwards. Every backend is
/// returned as `Cache(Metrics(Pool(driver)))`, with the cache layer present
/// only when a cache is attached and the TTL is non-zero, and the pool layer
/// present only when enabled in configuration.
pub struct StorageFactory {
    config: StorageConfig,
    metrics: Arc<dyn MetricsSink>,
    cache: Option<Arc<dyn KvCache>>,
    pool: Option<Arc<BufferPool>>,
    built: DashMap<StorageType, Arc<dyn Storage>>,
}

impl StorageFactory {
    /// Create a factory reporting to `metrics`, without a URL cache.
    #[must_use]
    pub fn new(config: StorageConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let pool = config
            .buffer_pool
            .enabled
            .then(|| BufferPool::from_config(&config.buffer_pool));
        Self {
            config,
            metrics,
            cache: None,
            pool,
            built: DashMap::new(),
        }
    }

    /// Attach a URL cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn KvCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Storage configuration in use.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Shared buffer pool, if pooling is enabled.
    #[must_use]
    pub const fn buffer_pool(&self) -> Option<&Arc<BufferPool>> {
        self.pool.as_ref()
    }

    /// Decorated backend for `storage_type`.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` naming the first empty required field, or a
    /// configuration error if the client cannot be built.
    pub fn get_storage(&self, storage_type: StorageType) -> Result<Arc<dyn Storage>, StorageError> {
        if let Some(storage) = self.built.get(&storage_type) {
            return Ok(Arc::clone(storage.value()));
        }

        self.config.validate(storage_type)?;
        let driver: Arc<dyn Storage> = Arc::new(match storage_type {
            StorageType::Local => OpendalStorage::local(&self.config)?,
            StorageType::S3 => OpendalStorage::s3(&self.config)?,
            StorageType::Oss => OpendalStorage::oss(&self.config)?,
            StorageType::Cos => OpendalStorage::cos(&self.config)?,
        });

        let storage = self.decorate(driver);
        info!(
            storage_type = %storage_type,
            cached = self.cache_enabled(),
            pooled = self.pool.is_some(),
            "storage backend initialized"
        );

        Ok(Arc::clone(
            self.built.entry(storage_type).or_insert(storage).value(),
        ))
    }

    /// Decorated backend selected by the configured `type`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedStorageType` for an unknown selector, otherwise
    /// the errors of [`get_storage`](Self::get_storage).
    pub fn get_current_storage(&self) -> Result<Arc<dyn Storage>, StorageError> {
        self.get_storage(self.config.current_type()?)
    }

    /// Register a prebuilt driver, decorated like a configured one.
    ///
    /// Replaces any backend previously built for the driver's type.
    pub fn register(&self, driver: Arc<dyn Storage>) -> Arc<dyn Storage> {
        let storage_type = driver.storage_type();
        let storage = self.decorate(driver);
        self.built.insert(storage_type, Arc::clone(&storage));
        storage
    }

    fn cache_enabled(&self) -> bool {
        self.cache.is_some() && self.config.cache_ttl().is_some()
    }

    fn decorate(&self, driver: Arc<dyn Storage>) -> Arc<dyn Storage> {
        let mut storage = driver;
        if let Some(pool) = &self.pool {
            storage = Arc::new(PoolStorage::new(storage, Arc::clone(pool)));
        }
        storage = Arc::new(MetricsStorage::new(storage, Arc::clone(&self.metrics)));
        if let (Some(cache), Some(ttl)) = (&self.cache, self.config.cache_ttl()) {
            storage = Arc::new(CacheStorage::new(storage, Arc::clone(cache), ttl));
        }
        storage
    }
}
