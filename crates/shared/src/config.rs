//! Application configuration management.
//!
//! Sources are layered: `config/default.toml`, `config/{RUN_MODE}.toml`, then
//! `STOWAGE__SECTION__KEY` environment variables. Sections owned by other
//! crates (such as `storage`) are read from the same layered source with
//! [`load_sources`].

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Recycle bin retention configuration.
    #[serde(default)]
    pub recycle: RecycleConfig,
    /// In-process key-value cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Recycle bin retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecycleConfig {
    /// Days a recycled file is kept before it is purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Seconds between cleaner sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_retention_days() -> u32 {
    30
}

fn default_interval_secs() -> u64 {
    3600 // 1 hour
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// In-process key-value cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached entries.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

fn default_cache_capacity() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
        }
    }
}

/// Builds the layered configuration source.
///
/// # Errors
///
/// Returns an error if a present config file cannot be parsed.
pub fn load_sources() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(config::Environment::with_prefix("STOWAGE").separator("__"))
        .build()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        load_sources()?.try_deserialize()
    }
}
