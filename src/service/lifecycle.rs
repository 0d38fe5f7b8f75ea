//! Shutdown coordination.

use super::HistorySync;

impl HistorySync {
    /// Stop the scheduler and any run in progress
    ///
    /// A run in flight finishes its current network call or file write and stops
    /// at its next checkpoint. Idempotent.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        tracing::info!("Initiating shutdown");
        self.gate().deactivate();
        self.shutdown.cancel();
        self.log.info(None, "Sync stopped");
    }

    /// Whether [`shutdown`](Self::shutdown) was called or a fatal error occurred
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once the service is shut down
    pub async fn shut_down(&self) {
        self.shutdown.cancelled().await;
    }
}
