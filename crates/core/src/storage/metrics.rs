//! Metrics sink for storage operations.
//!
//! The sink is created and registered once at startup and injected into
//! every metrics decorator the factory builds.

use dashmap::DashMap;

use super::types::{StorageOperation, StorageType};

/// Receives duration and error observations for storage operations.
pub trait MetricsSink: Send + Sync {
    /// Record how long one operation took.
    fn observe_duration(&self, storage_type: StorageType, op: StorageOperation, secs: f64);

    /// Count one failed operation.
    fn increment_error(&self, storage_type: StorageType, op: StorageOperation);
}

/// Aggregated observations for one `(storage_type, operation)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperationStats {
    /// Number of completed calls, successful or not.
    pub count: u64,
    /// Sum of observed durations in seconds.
    pub total_secs: f64,
    /// Longest observed duration in seconds.
    pub max_secs: f64,
    /// Number of failed calls.
    pub errors: u64,
}

impl OperationStats {
    /// Mean duration in seconds, zero before the first observation.
    #[must_use]
    pub fn mean_secs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = self.count as f64;
            self.total_secs / count
        }
    }
}

/// In-memory [`MetricsSink`] keyed by backend and operation.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    stats: DashMap<(StorageType, StorageOperation), OperationStats>,
}

impl InMemoryMetrics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stats for one pair.
    #[must_use]
    pub fn stats(&self, storage_type: StorageType, op: StorageOperation) -> OperationStats {
        self.stats
            .get(&(storage_type, op))
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Snapshot of every recorded pair.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(StorageType, StorageOperation, OperationStats)> {
        self.stats
            .iter()
            .map(|entry| {
                let (storage_type, op) = *entry.key();
                (storage_type, op, *entry.value())
            })
            .collect()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn observe_duration(&self, storage_type: StorageType, op: StorageOperation, secs: f64) {
        let mut entry = self.stats.entry((storage_type, op)).or_default();
        entry.count += 1;
        entry.total_secs += secs;
        if secs > entry.max_secs {
            entry.max_secs = secs;
        }
    }

    fn increment_error(&self, storage_type: StorageType, op: StorageOperation) {
        self.stats.entry((storage_type, op)).or_default().errors += 1;
    }
}
