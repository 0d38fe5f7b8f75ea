//! Core types for history-sync

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One completed generation job as listed by the remote catalog
///
/// Missing fields decode to empty values, so a listing entry without an `id`
/// reaches validation (and is rejected there) instead of failing the whole page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier, expected in canonical lowercase UUID form
    #[serde(default)]
    pub id: String,

    /// When the job was added to the remote queue (opaque server string)
    #[serde(default)]
    pub enqueue_time: String,

    /// Output image URLs, in listing order
    #[serde(default)]
    pub image_paths: Vec<String>,
}

/// Server-side ordering of the job listing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderingMode {
    /// Most recent first
    #[default]
    #[serde(rename = "new")]
    New,
    /// Highest rated of all time
    #[serde(rename = "top-all")]
    TopAll,
}

impl OrderingMode {
    /// The `orderBy` query value
    pub fn as_str(self) -> &'static str {
        match self {
            OrderingMode::New => "new",
            OrderingMode::TopAll => "top-all",
        }
    }
}

impl fmt::Display for OrderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderingMode::New),
            "top-all" => Ok(OrderingMode::TopAll),
            other => Err(format!(
                "unknown ordering mode {other:?} (expected \"new\" or \"top-all\")"
            )),
        }
    }
}

/// What [`JobProcessor::process_job`](crate::processor::JobProcessor::process_job) did with one job
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// Completion sentinel already present; nothing fetched
    AlreadyDownloaded,
    /// Fresh job directory; all images fetched
    Downloaded {
        /// Number of images written
        images: usize,
    },
    /// Directory existed without the sentinel; all images fetched again
    Resumed {
        /// Number of images written
        images: usize,
    },
    /// Job id failed validation; the kill switch was tripped
    Rejected,
}

/// Why a run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The run gate was disabled before the run started
    Inactive,
    /// Another run held the single-run lock
    AlreadyRunning,
    /// Every page up to the configured ceiling was walked
    PageCeiling,
    /// The configured number of consecutive empty pages was seen
    EmptyPageStreak,
    /// A run-level error stopped the walk
    Aborted {
        /// Diagnostic code of the error that stopped the run
        code: u16,
    },
    /// A job id failed validation and disabled further runs
    KillSwitch,
    /// The run was cancelled from outside
    Cancelled,
}

/// Summary of one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    /// Pages fetched and persisted
    pub pages_fetched: u32,
    /// Jobs downloaded into a fresh directory
    pub jobs_downloaded: usize,
    /// Jobs re-downloaded after an interrupted attempt
    pub jobs_resumed: usize,
    /// Jobs skipped because their sentinel was already present
    pub jobs_skipped: usize,
    /// Why the run ended
    pub stop: StopReason,
}

impl SyncReport {
    pub(crate) fn new(stop: StopReason) -> Self {
        Self {
            pages_fetched: 0,
            jobs_downloaded: 0,
            jobs_resumed: 0,
            jobs_skipped: 0,
            stop,
        }
    }

    pub(crate) fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::AlreadyDownloaded => self.jobs_skipped += 1,
            JobOutcome::Downloaded { .. } => self.jobs_downloaded += 1,
            JobOutcome::Resumed { .. } => self.jobs_resumed += 1,
            JobOutcome::Rejected => {}
        }
    }
}
