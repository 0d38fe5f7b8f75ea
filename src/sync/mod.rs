//! The page loop
//!
//! [`SyncOrchestrator::run_sync`] walks catalog pages `1..=page_ceiling` in
//! order. For every page it fetches the raw body, persists it as
//! `last_page_<n>.json`, decodes it and hands each job, in listing order, to
//! the [`JobProcessor`]. A checkpoint before every page and every job stops the
//! walk once the run gate is disabled or the run is cancelled.

mod run_state;

pub use run_state::{RunContext, RunGate};

use crate::catalog::CatalogSource;
use crate::config::SyncConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result, ToDiagnostic};
use crate::log_stream::LogStream;
use crate::processor::JobProcessor;
use crate::store::JobStore;
use crate::types::{Job, OrderingMode, StopReason, SyncReport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Drives catalog pages through the job processor
pub struct SyncOrchestrator {
    catalog: Arc<dyn CatalogSource>,
    processor: JobProcessor,
    gate: Arc<RunGate>,
    log: LogStream,
    page_ceiling: u32,
    stop_after_empty_pages: Option<u32>,
}

impl SyncOrchestrator {
    /// Create an orchestrator sharing `gate` with its owner
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        processor: JobProcessor,
        gate: Arc<RunGate>,
        log: LogStream,
        sync: &SyncConfig,
    ) -> Self {
        Self {
            catalog,
            processor,
            gate,
            log,
            page_ceiling: sync.page_ceiling,
            stop_after_empty_pages: sync.stop_after_empty_pages,
        }
    }

    /// The job store the processor writes to
    pub fn store(&self) -> &JobStore {
        self.processor.store()
    }

    /// The gate shared with the owning service
    pub fn gate(&self) -> &Arc<RunGate> {
        &self.gate
    }

    /// Execute one run
    ///
    /// Run-level failures (store root, catalog fetch, page write, decode) are
    /// logged and end the run with [`StopReason::Aborted`]; the returned report
    /// is still `Ok`.
    ///
    /// # Errors
    /// Process-fatal errors from the job processor are logged, disable the gate
    /// and are returned. Nothing after the failing job is processed.
    pub async fn run_sync(
        &self,
        credentials: &Credentials,
        ordering: OrderingMode,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        if !self.gate.is_enabled() {
            tracing::debug!("Run gate disabled, skipping sync");
            return Ok(SyncReport::new(StopReason::Inactive));
        }

        let Some(run) = self.gate.begin(cancel.child_token()) else {
            tracing::info!("A sync run is already in progress, skipping");
            return Ok(SyncReport::new(StopReason::AlreadyRunning));
        };

        self.execute(run, credentials, ordering).await
    }

    /// Walk the pages for a run that already holds the single-run lock
    ///
    /// # Errors
    /// Same as [`run_sync`](Self::run_sync).
    pub(crate) async fn execute(
        &self,
        run: RunContext,
        credentials: &Credentials,
        ordering: OrderingMode,
    ) -> Result<SyncReport> {
        tracing::info!(%ordering, page_ceiling = self.page_ceiling, "Sync run started");
        let mut report = SyncReport::new(StopReason::PageCeiling);

        if let Err(e) = self.store().ensure_root().await {
            return Ok(self.abort(report, &e));
        }

        let mut empty_streak = 0u32;
        for page in 1..=self.page_ceiling {
            if !run.is_active() {
                report.stop = run.halt_reason();
                break;
            }

            let jobs = match self.fetch_and_decode(credentials, ordering, page).await {
                Ok(jobs) => jobs,
                Err(e) => return Ok(self.abort(report, &e)),
            };
            report.pages_fetched += 1;
            tracing::debug!(page, jobs = jobs.len(), "Catalog page decoded");

            for job in &jobs {
                if !run.is_active() {
                    break;
                }
                match self.processor.process_job(job, &run).await {
                    Ok(outcome) => report.record(&outcome),
                    Err(e) => {
                        self.log.report(&e);
                        self.gate.deactivate();
                        self.log.error(
                            Some(e.diagnostic_code()),
                            format!("Stopped at job {}, no further runs will start", job.id),
                        );
                        return Err(e);
                    }
                }
            }

            if jobs.is_empty() {
                empty_streak += 1;
            } else {
                empty_streak = 0;
            }
            if let Some(limit) = self.stop_after_empty_pages
                && empty_streak >= limit
            {
                tracing::info!(page, empty_streak, "Empty page streak reached, ending run");
                report.stop = StopReason::EmptyPageStreak;
                break;
            }
        }

        // A kill switch tripped on the last job of the last page is still a kill switch
        if report.stop == StopReason::PageCeiling && !run.is_active() {
            report.stop = run.halt_reason();
        }

        self.log.info(
            None,
            format!(
                "Sync finished: {} page(s), {} downloaded, {} resumed, {} already present ({:?})",
                report.pages_fetched,
                report.jobs_downloaded,
                report.jobs_resumed,
                report.jobs_skipped,
                report.stop
            ),
        );
        Ok(report)
    }

    async fn fetch_and_decode(
        &self,
        credentials: &Credentials,
        ordering: OrderingMode,
        page: u32,
    ) -> Result<Vec<Job>> {
        let body = self.catalog.fetch_page(credentials, ordering, page).await?;
        self.store().write_page(page, &body).await?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode { page, source })
    }

    fn abort(&self, mut report: SyncReport, error: &Error) -> SyncReport {
        self.log.report(error);
        report.stop = StopReason::Aborted {
            code: error.diagnostic_code(),
        };
        tracing::warn!(
            pages_fetched = report.pages_fetched,
            code = error.diagnostic_code(),
            "Sync run aborted"
        );
        report
    }
}
