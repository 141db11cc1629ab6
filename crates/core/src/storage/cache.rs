//! Key-value cache used by the URL caching decorator.
//!
//! The decorator only needs get/set/delete with a per-entry TTL, so any
//! distributed cache can stand in for the in-process Moka implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;

use super::error::StorageError;

/// Default number of cached URLs.
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Key-value cache with per-entry expiry.
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Look up a value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with. Overwriting a key
/// restarts its clock.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process [`KvCache`] backed by Moka.
///
/// Thread-safe and cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct MokaKvCache {
    cache: Cache<String, Entry>,
}

impl MokaKvCache {
    /// Creates a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for MokaKvCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl KvCache for MokaKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.cache.get(key).map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        if Instant::now().checked_add(ttl).is_none() {
            return Err(StorageError::cache(format!("ttl {ttl:?} overflows")));
        }
        self.cache.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.cache.invalidate(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MokaKvCache::new(16);

        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);

        // Deleting again is not an error
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MokaKvCache::new(16);
        cache.set("k", "v", Duration::from_millis(20)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let cache = MokaKvCache::new(16);
        cache.set("short", "v", Duration::from_millis(20)).await.unwrap();
        cache.set("long", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.entry_count(), 2);

        // Moka's expiry timer wheel ticks at roughly one-second granularity
        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Gone without ever being read
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_overwrite_uses_new_ttl() {
        let cache = MokaKvCache::new(16);
        cache.set("k", "old", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "new", Duration::from_millis(20)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MokaKvCache::default();
        let other = cache.clone();

        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(other.entry_count(), 1);
    }
}
