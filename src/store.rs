//! Filesystem job store
//!
//! Layout under the root directory:
//!
//! ```text
//! jobs/
//! ├── last_page_1.json          # raw catalog page dumps, overwritten each run
//! ├── last_page_2.json
//! └── <job id>/
//!     ├── job.json              # the listing entry as it was processed
//!     ├── 0_0.png               # images, named by the last URL segment
//!     └── completed             # empty sentinel, present iff every image landed
//! ```
//!
//! A job directory without the sentinel may hold any subset of its images;
//! re-processing the job fetches all of them again.

use crate::error::{Error, Result};
use crate::types::Job;
use crate::validation::validate_job_id;
use std::path::{Path, PathBuf};

/// File holding the serialized [`Job`] inside a job directory
pub const JOB_RECORD_FILE: &str = "job.json";

/// Zero-length marker written after the last image of a job
pub const COMPLETED_SENTINEL: &str = "completed";

/// What is on disk for one job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// No directory for this job
    Missing,
    /// Directory exists but the sentinel does not (interrupted attempt)
    Partial,
    /// Sentinel present; nothing left to do
    Completed,
}

/// Handle to the job store root. Cheap to clone; holds no open files.
#[derive(Clone, Debug)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// Create a handle for the store rooted at `root` (nothing is touched on disk)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| Error::StoreRoot {
                path: self.root.clone(),
                source,
            })
    }

    /// Path of the raw dump for catalog page `page`
    pub fn page_artifact_path(&self, page: u32) -> PathBuf {
        self.root.join(format!("last_page_{page}.json"))
    }

    /// Write the raw bytes of catalog page `page`, replacing any previous dump
    pub async fn write_page(&self, page: u32, body: &[u8]) -> Result<PathBuf> {
        let path = self.page_artifact_path(page);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| Error::PageWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Directory for job `id`
    ///
    /// Callers must have validated `id`; this only joins paths.
    pub fn job_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Inspect the directory for job `id`
    pub async fn job_state(&self, id: &str) -> JobState {
        let dir = self.job_dir(id);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {
                match tokio::fs::try_exists(dir.join(COMPLETED_SENTINEL)).await {
                    Ok(true) => JobState::Completed,
                    _ => JobState::Partial,
                }
            }
            _ => JobState::Missing,
        }
    }

    /// Create the directory for job `id`
    pub async fn create_job_dir(&self, id: &str) -> Result<PathBuf> {
        let dir = self.job_dir(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Persistence {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        Ok(dir)
    }

    /// Serialize `job` into its directory, replacing any earlier copy
    pub async fn write_job_record(&self, job: &Job) -> Result<PathBuf> {
        let path = self.job_dir(&job.id).join(JOB_RECORD_FILE);
        let json = serde_json::to_vec(job).map_err(|e| Error::Persistence {
            path: path.clone(),
            reason: format!("serialization failed: {e}"),
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| Error::Persistence {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(path)
    }

    /// Write the zero-length completion sentinel for job `id`
    pub async fn mark_completed(&self, id: &str) -> Result<()> {
        let path = self.job_dir(id).join(COMPLETED_SENTINEL);
        tokio::fs::write(&path, b"")
            .await
            .map_err(|e| Error::Persistence {
                path,
                reason: e.to_string(),
            })
    }

    /// Ids of every job whose directory holds the sentinel, sorted
    ///
    /// Directories whose name is not a valid job id are ignored.
    pub async fn completed_jobs(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !validate_job_id(&name) {
                continue;
            }
            if self.job_state(&name).await == JobState::Completed {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Read back the stored listing entry for job `id`
    pub async fn read_job(&self, id: &str) -> Result<Job> {
        let raw = tokio::fs::read(self.job_dir(id).join(JOB_RECORD_FILE)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
