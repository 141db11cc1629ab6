//! Periodic purge of expired recycle-bin entries.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use stowage_shared::config::RecycleConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::drive::{DriveError, DriveRepository, DriveService, FileRepository};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files whose object and row were removed.
    pub purged: usize,
    /// Files that could not be purged and stay in the bin.
    pub failed: usize,
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Background task that permanently deletes files recycled longer ago than
/// the retention period.
///
/// A failed purge is logged and retried on the next sweep.
pub struct RecycleCleaner<R: DriveRepository + 'static> {
    service: Arc<DriveService<R>>,
    retention: chrono::Duration,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl<R: DriveRepository + 'static> RecycleCleaner<R> {
    /// Create a cleaner sweeping every `interval`.
    #[must_use]
    pub fn new(service: Arc<DriveService<R>>, retention: chrono::Duration, interval: Duration) -> Self {
        Self {
            service,
            retention,
            interval,
            worker: Mutex::new(None),
        }
    }

    /// Create a cleaner from the `recycle` configuration section.
    #[must_use]
    pub fn from_config(service: Arc<DriveService<R>>, config: &RecycleConfig) -> Self {
        Self::new(
            service,
            chrono::Duration::days(i64::from(config.retention_days)),
            Duration::from_secs(config.interval_secs.max(1)),
        )
    }

    /// Files recycled before `now - retention` are due.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.retention
    }

    /// Returns `true` while the background task is running.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Start sweeping in the background. Calling it again while running
    /// does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            debug!("recycle cleaner already running");
            return;
        }

        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_loop(
            Arc::clone(&self.service),
            self.retention,
            self.interval,
            rx,
        ));
        *worker = Some(Worker { shutdown, handle });
        info!(
            retention_days = self.retention.num_days(),
            interval_secs = self.interval.as_secs(),
            "recycle cleaner started"
        );
    }

    /// Signal the background task to stop and wait for it to finish.
    ///
    /// A sweep in progress runs to completion first.
    pub async fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };

        // Receiver is gone if the task already exited
        let _ = worker.shutdown.send(true);
        if let Err(err) = worker.handle.await {
            warn!(error = %err, "recycle cleaner task ended abnormally");
        }
        info!("recycle cleaner stopped");
    }

    /// Run one sweep as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the expired files cannot be listed.
    /// Individual purge failures are counted in the report.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<CleanupReport, DriveError> {
        sweep(&self.service, self.cutoff(now)).await
    }
}

async fn sweep<R: DriveRepository>(
    service: &DriveService<R>,
    before: DateTime<Utc>,
) -> Result<CleanupReport, DriveError> {
    let expired = service.repository().get_expired_recycle_files(before).await?;
    let mut report = CleanupReport::default();

    for file in &expired {
        match service.purge_file(file).await {
            Ok(()) => {
                report.purged += 1;
                debug!(file_id = %file.id, path = %file.path, "expired file purged");
            }
            Err(err) => {
                report.failed += 1;
                warn!(
                    file_id = %file.id,
                    path = %file.path,
                    error = %err,
                    "failed to purge expired file"
                );
            }
        }
    }

    if !expired.is_empty() {
        info!(
            purged = report.purged,
            failed = report.failed,
            "recycle sweep completed"
        );
    }
    Ok(report)
}

async fn sweep_loop<R: DriveRepository + 'static>(
    service: Arc<DriveService<R>>,
    retention: chrono::Duration,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                debug!("recycle cleaner shutting down");
                return;
            }
        }

        if let Err(err) = sweep(&service, Utc::now() - retention).await {
            warn!(error = %err, "recycle sweep failed");
        }
    }
}
