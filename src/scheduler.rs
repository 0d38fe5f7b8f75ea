//! Interval-driven sync runs
//!
//! The scheduler owns one timer. Each tick triggers
//! [`HistorySync::run_scheduled`]; on-demand runs go through
//! [`HistorySync::sync_now`] instead and share the same single-run lock, so a
//! tick that lands during an on-demand run is a no-op.
//!
//! # Example
//!
//! ```no_run
//! use history_sync::{Config, HistorySync};
//! use history_sync::scheduler::SyncScheduler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let interval = config.sync.interval;
//! let service = HistorySync::new(config)?;
//!
//! let scheduler = SyncScheduler::new(service.clone(), interval);
//!
//! // Run scheduler (returns after shutdown or a fatal error)
//! tokio::spawn(async move {
//!     scheduler.run().await;
//! });
//! # Ok(())
//! # }
//! ```

use crate::HistorySync;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

/// Background task triggering a run every `interval`
pub struct SyncScheduler {
    service: HistorySync,
    interval: Duration,
}

impl SyncScheduler {
    /// Creates a new scheduler
    pub fn new(service: HistorySync, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Starts the scheduler loop
    ///
    /// The first tick fires one interval after start. Ticks missed while a run
    /// was in progress are not replayed. The loop ends when the service shuts
    /// down or a run returns a process-fatal error.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Sync scheduler started");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.service.shut_down() => {
                    info!("Sync scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.service.run_scheduled().await {
                        Ok(report) => {
                            debug!(stop = ?report.stop, pages = report.pages_fetched, "Scheduled run finished");
                        }
                        Err(e) => {
                            error!(error = %e, "Scheduled run hit a fatal error, stopping scheduler");
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_helpers::{RecordingImages, ScriptedCatalog, job};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service_in(temp: &TempDir, catalog: Arc<ScriptedCatalog>, interval: Duration) -> HistorySync {
        let mut config = Config::default();
        config.store.jobs_dir = temp.path().join("jobs");
        config.credentials.user_id_file = temp.path().join("userid.txt");
        config.credentials.session_token_file = temp.path().join("sessiontoken.txt");
        config.sync.page_ceiling = 1;
        config.sync.interval = interval;
        std::fs::write(&config.credentials.user_id_file, "user").unwrap();
        std::fs::write(&config.credentials.session_token_file, "token").unwrap();
        HistorySync::with_sources(config, catalog, Arc::new(RecordingImages::default()))
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_scheduler() {
        let temp = tempfile::tempdir().unwrap();
        let catalog = Arc::new(ScriptedCatalog::default());
        let service = service_in(&temp, catalog.clone(), Duration::from_secs(3600));

        let handle = service.start_scheduler();
        service.shutdown();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should exit promptly")
            .unwrap();
        assert!(catalog.pages_requested().is_empty(), "no tick before one interval");
    }

    #[tokio::test]
    async fn ticks_trigger_scheduled_runs() {
        let temp = tempfile::tempdir().unwrap();
        let catalog = Arc::new(ScriptedCatalog::default());
        let service = service_in(&temp, catalog.clone(), Duration::from_millis(20));

        let handle = service.start_scheduler();
        tokio::time::timeout(Duration::from_secs(5), async {
            while catalog.pages_requested().len() < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("two scheduled runs");

        service.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn fatal_error_ends_the_scheduler() {
        let temp = tempfile::tempdir().unwrap();
        let catalog = Arc::new(ScriptedCatalog::default().with_jobs(
            1,
            &[job(
                "11111111-1111-1111-1111-111111111111",
                &["https://cdn/x/not-an-image.exe"],
            )],
        ));
        let service = service_in(&temp, catalog.clone(), Duration::from_millis(20));

        let handle = service.start_scheduler();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop on its own")
            .unwrap();

        assert_eq!(service.fatal_error().unwrap().code, 807);
        assert!(service.is_shut_down());
        assert_eq!(catalog.pages_requested(), vec![1], "no run after the fatal one");
    }

    #[tokio::test]
    async fn disabled_gate_turns_ticks_into_no_ops() {
        let temp = tempfile::tempdir().unwrap();
        let catalog = Arc::new(ScriptedCatalog::default());
        let service = service_in(&temp, catalog.clone(), Duration::from_millis(10));
        service.deactivate();

        let handle = service.start_scheduler();
        tokio::time::sleep(Duration::from_millis(60)).await;
        service.shutdown();
        handle.await.unwrap();

        assert!(catalog.pages_requested().is_empty());
    }
}
