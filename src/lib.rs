//! # history-sync
//!
//! Library for mirroring a user's completed generation jobs (metadata plus output
//! images) from a paginated remote listing into a local directory tree.
//!
//! ## Design Philosophy
//!
//! history-sync is designed to be:
//! - **Exactly-once on disk** - A completion sentinel marks finished jobs; anything
//!   without one is downloaded again on the next run
//! - **Safe with hostile listings** - Job ids and image filenames are validated
//!   before they become paths
//! - **Library-first** - A front-end supplies credentials, triggers runs and
//!   subscribes to the log stream; the bundled binary is a thin headless wrapper
//!
//! ## Quick Start
//!
//! ```no_run
//! use history_sync::{Config, HistorySync};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = HistorySync::new(Config::default())?;
//!
//!     // Subscribe to the log stream
//!     let mut lines = service.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(line) = lines.recv().await {
//!             println!("{line}");
//!         }
//!     });
//!
//!     let report = service.sync_now().await?;
//!     println!("{} new job(s)", report.jobs_downloaded);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Paginated catalog client
pub mod catalog;
/// Configuration types
pub mod config;
/// Credential files
pub mod credentials;
/// Error types
pub mod error;
/// Image downloads
pub mod images;
/// Log stream for front-ends
pub mod log_stream;
/// Per-job processing
pub mod processor;
/// Interval scheduler
pub mod scheduler;
/// Service handle
pub mod service;
/// Filesystem job store
pub mod store;
/// Page loop and run gating
pub mod sync;
/// Core types
pub mod types;
/// Job id and image filename validation
pub mod validation;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use catalog::{CatalogSource, HttpCatalogClient};
pub use config::Config;
pub use credentials::Credentials;
pub use error::{Error, FatalError, Result, Severity, ToDiagnostic};
pub use images::{HttpImageFetcher, ImageFetcher};
pub use log_stream::{LogLevel, LogLine, LogStream};
pub use service::HistorySync;
pub use store::{JobState, JobStore};
pub use sync::{RunContext, RunGate};
pub use types::{Job, JobOutcome, OrderingMode, StopReason, SyncReport};

/// Time allowed for background tasks to reach a checkpoint after shutdown
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

/// Run until a termination signal or a fatal error, then shut down.
///
/// `tasks` are the background tasks to wait for once shutdown starts, such as
/// the scheduler from [`HistorySync::start_scheduler`] and any spawned
/// [`HistorySync::sync_now`]. Together they get a 30 second grace period to
/// finish their current write and stop at a checkpoint.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
///
/// Returns the recorded [`FatalError`] if a run hit a process-fatal error.
///
/// # Example
///
/// ```no_run
/// use history_sync::{Config, HistorySync, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = HistorySync::new(Config::default())?;
///     let scheduler = service.start_scheduler();
///
///     // Run with automatic signal handling
///     run_with_shutdown(&service, [scheduler]).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown<I>(
    service: &HistorySync,
    tasks: I,
) -> std::result::Result<(), FatalError>
where
    I: IntoIterator<Item = tokio::task::JoinHandle<()>>,
{
    tokio::select! {
        _ = wait_for_signal() => {}
        _ = service.shut_down() => {}
    }
    service.shutdown();

    let tasks: Vec<_> = tasks.into_iter().collect();
    let join_all = async {
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task failed");
            }
        }
    };
    match tokio::time::timeout(SHUTDOWN_GRACE, join_all).await {
        Ok(()) => tracing::info!("Background tasks stopped"),
        Err(_) => tracing::warn!("Timeout waiting for background tasks, proceeding with shutdown"),
    }

    match service.fatal_error() {
        Some(fatal) => Err(fatal),
        None => Ok(()),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
