//! Periodic purge on the tokio runtime

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::Cache;
use crate::purge::PurgeReport;

/// Runs [`Cache::purge_report`] on a fixed interval.
///
/// The first pass runs immediately. Missed ticks are skipped rather than
/// bursted. Dropping the scheduler aborts the task.
#[derive(Debug)]
pub struct PurgeScheduler {
    handle: Option<JoinHandle<()>>,
    reports: watch::Receiver<Option<PurgeReport>>,
}

impl PurgeScheduler {
    /// Spawn the purge task on the current tokio runtime.
    ///
    /// A zero `interval` starts nothing; the scheduler is then inert.
    pub fn start(cache: Cache, interval: Duration) -> Self {
        let (tx, reports) = watch::channel(None);

        if interval == Duration::ZERO {
            tracing::debug!("Purge interval is zero, not scheduling purges");
            return Self {
                handle: None,
                reports,
            };
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let cache = cache.clone();
                match tokio::task::spawn_blocking(move || cache.purge_report()).await {
                    Ok(Ok(report)) => {
                        if tx.send(Some(report)).is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Scheduled purge failed: {}", e);
                    }
                    Err(e) => {
                        tracing::warn!("Scheduled purge task panicked: {}", e);
                    }
                }
            }
        });

        tracing::debug!("Scheduled purge every {:?}", interval);
        Self {
            handle: Some(handle),
            reports,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Report of the most recent successful pass
    pub fn last_purged(&self) -> Option<PurgeReport> {
        *self.reports.borrow()
    }

    /// Wait for the next successful pass. Returns `None` once the task has stopped.
    pub async fn next_report(&mut self) -> Option<PurgeReport> {
        self.reports.changed().await.ok()?;
        *self.reports.borrow_and_update()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PurgeScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
