//! Stowage host process.
//!
//! Wires configuration, the database, and the storage factory into a drive
//! service, then runs the recycle cleaner until interrupted.

use std::sync::Arc;

use anyhow::Context;
use config::ConfigError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage_core::drive::DriveService;
use stowage_core::recycle::RecycleCleaner;
use stowage_core::storage::{InMemoryMetrics, MokaKvCache, Storage, StorageConfig, StorageFactory};
use stowage_db::{DriveStore, connect_with};
use stowage_shared::AppConfig;
use stowage_shared::config::load_sources;

/// Read the `storage` section, falling back to defaults when absent.
fn load_storage_config() -> Result<StorageConfig, ConfigError> {
    match load_sources()?.get::<StorageConfig>("storage") {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => Ok(StorageConfig::default()),
        Err(err) => Err(err),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stowage=debug,stowage_core=debug,stowage_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let storage_config = load_storage_config().context("failed to load storage configuration")?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let metrics = Arc::new(InMemoryMetrics::new());
    let factory = StorageFactory::new(storage_config, metrics.clone())
        .with_cache(Arc::new(MokaKvCache::new(config.cache.max_capacity)));

    // Fail fast on a misconfigured backend
    let storage = factory
        .get_current_storage()
        .context("failed to initialize storage backend")?;
    info!(storage_type = %storage.storage_type(), "Storage backend ready");

    let service = Arc::new(DriveService::new(
        Arc::new(factory),
        Arc::new(DriveStore::new(db)),
    ));

    let cleaner = RecycleCleaner::from_config(Arc::clone(&service), &config.recycle);
    cleaner.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    cleaner.stop().await;
    for (storage_type, operation, stats) in metrics.snapshot() {
        info!(
            storage_type = %storage_type,
            operation = %operation,
            count = stats.count,
            errors = stats.errors,
            mean_secs = stats.mean_secs(),
            "storage operation totals"
        );
    }

    Ok(())
}
