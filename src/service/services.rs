//! Background service starters.

use crate::scheduler::SyncScheduler;

use super::HistorySync;

impl HistorySync {
    /// Start the interval scheduler
    ///
    /// The first scheduled run happens one interval from now; call
    /// [`sync_now`](Self::sync_now) for an immediate run. The task ends on
    /// [`shutdown`](Self::shutdown) or after a process-fatal error, which is then
    /// available from [`fatal_error`](Self::fatal_error).
    pub fn start_scheduler(&self) -> tokio::task::JoinHandle<()> {
        let scheduler = SyncScheduler::new(self.clone(), self.config.sync.interval);

        let handle = tokio::spawn(async move {
            scheduler.run().await;
        });

        tracing::info!(
            interval_secs = self.config.sync.interval.as_secs(),
            "Sync scheduler background task started"
        );

        handle
    }
}
