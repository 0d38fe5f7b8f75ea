//! The service handle a binary or front-end holds.
//!
//! [`HistorySync`] methods are organized by concern:
//! - [`control`] - gate control and the two run triggers
//! - [`services`] - background scheduler startup
//! - [`lifecycle`] - shutdown

mod control;
mod lifecycle;
mod services;


use crate::catalog::{CatalogSource, HttpCatalogClient};
use crate::config::Config;
use crate::error::{FatalError, Result};
use crate::images::{HttpImageFetcher, ImageFetcher};
use crate::log_stream::{LogLine, LogStream};
use crate::processor::JobProcessor;
use crate::store::JobStore;
use crate::sync::{RunGate, SyncOrchestrator};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Periodic job-history mirror (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct HistorySync {
    /// Configuration the service was built from
    pub(crate) config: Arc<Config>,
    /// Page loop shared by scheduled and on-demand runs
    pub(crate) orchestrator: Arc<SyncOrchestrator>,
    /// Log stream handed to subscribers
    pub(crate) log: LogStream,
    /// Cancelled once by [`HistorySync::shutdown`]; every run uses a child token
    pub(crate) shutdown: CancellationToken,
    /// First process-fatal error, if any
    pub(crate) fatal: Arc<OnceLock<FatalError>>,
}

impl HistorySync {
    /// Create a service talking to the configured HTTP endpoint
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate or an HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(HttpCatalogClient::new(&config.api)?);
        let images = Arc::new(HttpImageFetcher::new(&config.api)?);
        Ok(Self::with_sources(config, catalog, images))
    }

    /// Create a service with caller-supplied network collaborators
    pub fn with_sources(
        config: Config,
        catalog: Arc<dyn CatalogSource>,
        images: Arc<dyn ImageFetcher>,
    ) -> Self {
        let log = LogStream::new();
        let store = JobStore::new(config.store.jobs_dir.clone());
        let processor = JobProcessor::new(store, images, log.clone());
        let orchestrator = SyncOrchestrator::new(
            catalog,
            processor,
            Arc::new(RunGate::new()),
            log.clone(),
            &config.sync,
        );

        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            log,
            shutdown: CancellationToken::new(),
            fatal: Arc::new(OnceLock::new()),
        }
    }

    /// Subscribe to the log stream
    ///
    /// Multiple subscribers are supported; each receives every line emitted
    /// after it subscribed. A subscriber that falls more than 1000 lines behind
    /// receives `RecvError::Lagged` and skips ahead.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LogLine> {
        self.log.subscribe()
    }

    /// Read access to the job store (for galleries and other readers)
    pub fn store(&self) -> &JobStore {
        self.orchestrator.store()
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The process-fatal error that stopped this service, if one occurred
    pub fn fatal_error(&self) -> Option<FatalError> {
        self.fatal.get().cloned()
    }

    pub(crate) fn gate(&self) -> &Arc<RunGate> {
        self.orchestrator.gate()
    }
}
