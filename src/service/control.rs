//! Gate control and run triggers.

use crate::credentials::Credentials;
use crate::error::{FatalError, Result, ToDiagnostic};
use crate::sync::RunContext;
use crate::types::{StopReason, SyncReport};

use super::HistorySync;

impl HistorySync {
    /// Allow runs again after the kill switch or [`deactivate`](Self::deactivate)
    pub fn activate(&self) {
        tracing::info!("Sync runs activated");
        self.gate().activate();
    }

    /// Refuse new runs and stop the current one at its next checkpoint
    pub fn deactivate(&self) {
        tracing::info!("Sync runs deactivated");
        self.gate().deactivate();
    }

    /// Whether runs may currently start
    pub fn is_active(&self) -> bool {
        self.gate().is_enabled()
    }

    /// Whether a run is in progress right now
    pub fn is_running(&self) -> bool {
        self.gate().is_running()
    }

    /// On-demand run, as requested by a user opening the processing view
    ///
    /// Re-activates the gate once the single-run lock is taken, so this also
    /// clears a tripped kill switch. While another run is in progress the gate
    /// is left alone and the call returns [`StopReason::AlreadyRunning`]. After
    /// shutdown or a process-fatal error nothing runs again.
    ///
    /// # Errors
    /// Returns the process-fatal error if one occurs during this run.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        if let Some(fatal) = self.fatal_error() {
            tracing::warn!(code = fatal.code, "Refusing on-demand sync after a fatal error");
            return Ok(SyncReport::new(StopReason::Inactive));
        }
        if self.is_shut_down() {
            tracing::debug!("Service shut down, skipping on-demand sync");
            return Ok(SyncReport::new(StopReason::Cancelled));
        }

        let Some(run) = self.gate().begin_activated(self.shutdown.child_token()) else {
            tracing::info!("A sync run is already in progress, skipping");
            return Ok(SyncReport::new(StopReason::AlreadyRunning));
        };
        tracing::info!("Sync runs activated");
        self.run_with(run).await
    }

    /// One timer-triggered run
    ///
    /// Unlike [`sync_now`](Self::sync_now) this leaves a disabled gate alone.
    ///
    /// # Errors
    /// Returns the process-fatal error if one occurs during this run.
    pub async fn run_scheduled(&self) -> Result<SyncReport> {
        // Credentials are only read for runs that can actually start
        if !self.is_active() {
            tracing::debug!("Sync runs inactive, skipping");
            return Ok(SyncReport::new(StopReason::Inactive));
        }
        let Some(run) = self.gate().begin(self.shutdown.child_token()) else {
            tracing::info!("A sync run is already in progress, skipping");
            return Ok(SyncReport::new(StopReason::AlreadyRunning));
        };
        self.run_with(run).await
    }

    async fn run_with(&self, run: RunContext) -> Result<SyncReport> {
        let credentials = match Credentials::load(&self.config.credentials).await {
            Ok(credentials) => credentials,
            Err(e) => {
                self.log.report(&e);
                return Ok(SyncReport::new(StopReason::Aborted {
                    code: e.diagnostic_code(),
                }));
            }
        };

        match self
            .orchestrator
            .execute(run, &credentials, self.config.sync.ordering)
            .await
        {
            Ok(report) => Ok(report),
            Err(e) => {
                // Only the first fatal error is kept
                let _ = self.fatal.set(FatalError::from(&e));
                tracing::error!(error = %e, "Fatal sync error, shutting down");
                self.shutdown.cancel();
                Err(e)
            }
        }
    }
}
