//! Error types for history-sync
//!
//! This module provides the error taxonomy for the sync pipeline:
//! - Domain-specific variants for catalog fetch, decode, validation and persistence
//! - Numeric diagnostic codes shown in the log stream
//! - A [`Severity`] for each error that decides whether it stops the run,
//!   trips the kill switch, or is fatal for the whole process

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for history-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for history-sync
///
/// Each variant carries enough context (page number, job id, path, URL) for the
/// log line alone to identify what failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "sync.page_ceiling")
        key: Option<String>,
    },

    /// A credential file could not be read or was empty
    #[error("failed to read {kind} from {}: {reason}", path.display())]
    Credentials {
        /// Which credential was being read
        kind: CredentialKind,
        /// The file that was read
        path: PathBuf,
        /// Why the read failed
        reason: String,
    },

    /// The job store root directory could not be created
    #[error("failed to create job store at {}: {source}", path.display())]
    StoreRoot {
        /// The job store root
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Catalog page request failed (construction, transport, status or body read)
    #[error("failed to fetch catalog page {page}: {reason}")]
    CatalogFetch {
        /// The 1-based page number
        page: u32,
        /// The reason the fetch failed
        reason: String,
    },

    /// Raw page artifact could not be written
    #[error("failed to write page artifact {}: {source}", path.display())]
    PageWrite {
        /// The artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Catalog page is not a JSON array of jobs
    #[error("failed to decode catalog page {page}: {source}")]
    Decode {
        /// The 1-based page number
        page: u32,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Job identifier failed the UUID check
    #[error("potentially unsafe job id {id:?}")]
    UnsafeJobId {
        /// The rejected identifier
        id: String,
    },

    /// Image URL ends in a filename that failed the filename check
    #[error("potentially unsafe image path {url} ending in {filename:?}")]
    UnsafeImageFilename {
        /// The full image URL
        url: String,
        /// The final path segment that was rejected
        filename: String,
    },

    /// Job metadata or completion sentinel could not be persisted
    #[error("failed to persist {}: {reason}", path.display())]
    Persistence {
        /// The file that could not be written
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// Image request failed (transport, status or body read)
    #[error("failed to download image {url}: {reason}")]
    ImageDownload {
        /// The image URL
        url: String,
        /// The reason the download failed
        reason: String,
    },

    /// Downloaded image bytes could not be written to disk
    #[error("failed to write image {}: {source}", path.display())]
    ImageWrite {
        /// The destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Record of the process-fatal error that stopped a [`HistorySync`](crate::HistorySync)
///
/// [`Error`] is not `Clone`, so the service keeps this snapshot for the binary
/// (and any front-end) to inspect after the scheduler has exited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct FatalError {
    /// Diagnostic code of the original error
    pub code: u16,
    /// Rendered message of the original error
    pub message: String,
}

impl From<&Error> for FatalError {
    fn from(error: &Error) -> Self {
        Self {
            code: error.diagnostic_code(),
            message: error.to_string(),
        }
    }
}

/// The two credential strings the sync needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// The remote user identifier
    UserId,
    /// The session token carried in the auth cookie
    SessionToken,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::UserId => f.write_str("user id"),
            CredentialKind::SessionToken => f.write_str("session token"),
        }
    }
}

/// How far an error escalates
///
/// The asymmetry between [`Severity::DisableRuns`] and [`Severity::Process`] is a
/// deliberate policy: a bad job id means the listing itself is suspect, so further
/// runs are refused until someone re-activates the gate; a bad image filename,
/// a failed image download or a failed metadata write means the job directory may
/// now be inconsistent, so nothing else may run in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Stop the current run; the next scheduled run starts fresh
    Run,
    /// Stop the current run and refuse further runs until re-activated
    DisableRuns,
    /// Stop everything; the process should exit non-zero
    Process,
}

/// Map errors to log-stream diagnostics
pub trait ToDiagnostic {
    /// Numeric code prefixed to the log line (e.g. `[803]`)
    fn diagnostic_code(&self) -> u16;

    /// Machine-readable error code
    fn error_code(&self) -> &str;

    /// Escalation level
    fn severity(&self) -> Severity;
}

impl ToDiagnostic for Error {
    fn diagnostic_code(&self) -> u16 {
        match self {
            Error::StoreRoot { .. } => 800,
            Error::Credentials {
                kind: CredentialKind::UserId,
                ..
            } => 801,
            Error::Credentials {
                kind: CredentialKind::SessionToken,
                ..
            } => 802,
            Error::CatalogFetch { .. } => 803,
            Error::PageWrite { .. } => 804,
            Error::Decode { .. } => 805,
            Error::UnsafeJobId { .. } => 806,
            Error::UnsafeImageFilename { .. } => 807,
            Error::Persistence { .. } => 808,
            Error::ImageDownload { .. } => 809,
            Error::ImageWrite { .. } => 810,
            Error::Config { .. } => 890,
            Error::Io(_) => 891,
            Error::Serialization(_) => 892,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Credentials { .. } => "credentials_unavailable",
            Error::StoreRoot { .. } => "store_root_failed",
            Error::CatalogFetch { .. } => "catalog_fetch_failed",
            Error::PageWrite { .. } => "page_write_failed",
            Error::Decode { .. } => "decode_failed",
            Error::UnsafeJobId { .. } => "unsafe_job_id",
            Error::UnsafeImageFilename { .. } => "unsafe_image_filename",
            Error::Persistence { .. } => "persistence_failed",
            Error::ImageDownload { .. } => "image_download_failed",
            Error::ImageWrite { .. } => "image_write_failed",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Error::UnsafeJobId { .. } => Severity::DisableRuns,
            Error::UnsafeImageFilename { .. }
            | Error::Persistence { .. }
            | Error::ImageDownload { .. }
            | Error::ImageWrite { .. } => Severity::Process,
            Error::Config { .. }
            | Error::Credentials { .. }
            | Error::StoreRoot { .. }
            | Error::CatalogFetch { .. }
            | Error::PageWrite { .. }
            | Error::Decode { .. }
            | Error::Io(_)
            | Error::Serialization(_) => Severity::Run,
        }
    }
}
