//! Idempotent, resumable materialization of one job
//!
//! For a job that passes validation the processor:
//! 1. returns early if the job directory already holds the completion sentinel
//! 2. creates the directory, or warns that a previous attempt was interrupted
//! 3. writes `job.json`
//! 4. downloads every image, in listing order, overwriting partial files
//! 5. writes the sentinel
//!
//! An unsafe job id trips the run's kill switch and touches nothing on disk.
//! Every other failure is returned as an error of [`Severity::Process`](crate::error::Severity::Process).

use crate::error::{Error, Result};
use crate::images::ImageFetcher;
use crate::log_stream::{CODE_IMAGE_DOWNLOAD, LogStream};
use crate::store::{JobState, JobStore};
use crate::sync::RunContext;
use crate::types::{Job, JobOutcome};
use crate::validation::{image_filename, validate_image_filename, validate_job_id};
use std::sync::Arc;

/// Writes jobs into a [`JobStore`] using an [`ImageFetcher`]
///
/// The processor is the only writer of job directories.
#[derive(Clone)]
pub struct JobProcessor {
    store: JobStore,
    images: Arc<dyn ImageFetcher>,
    log: LogStream,
}

impl JobProcessor {
    /// Create a processor
    pub fn new(store: JobStore, images: Arc<dyn ImageFetcher>, log: LogStream) -> Self {
        Self { store, images, log }
    }

    /// The store this processor writes to
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Materialize `job` on disk
    ///
    /// # Errors
    /// Unsafe image filenames, failed downloads and failed metadata or sentinel
    /// writes are returned as errors; all of them are fatal for the process.
    pub async fn process_job(&self, job: &Job, run: &RunContext) -> Result<JobOutcome> {
        if !validate_job_id(&job.id) {
            self.log.report(&Error::UnsafeJobId { id: job.id.clone() });
            run.trip_kill_switch();
            return Ok(JobOutcome::Rejected);
        }

        let resumed = match self.store.job_state(&job.id).await {
            JobState::Completed => {
                self.log
                    .info(None, format!("Skipping {} -- already downloaded.", job.id));
                return Ok(JobOutcome::AlreadyDownloaded);
            }
            JobState::Partial => {
                self.log.warn(
                    None,
                    format!("{} did not finish syncing. Will try again!", job.id),
                );
                true
            }
            JobState::Missing => {
                self.log.info(None, format!("Downloading {}", job.id));
                self.store.create_job_dir(&job.id).await?;
                false
            }
        };

        self.store.write_job_record(job).await?;

        let dir = self.store.job_dir(&job.id);
        for url in &job.image_paths {
            let filename = image_filename(url);
            if !validate_image_filename(filename) {
                return Err(Error::UnsafeImageFilename {
                    url: url.clone(),
                    filename: filename.to_string(),
                });
            }

            self.log.info(Some(CODE_IMAGE_DOWNLOAD), filename);
            self.images.download_image(url, &dir.join(filename)).await?;
        }

        self.store.mark_completed(&job.id).await?;
        tracing::debug!(job_id = %job.id, images = job.image_paths.len(), resumed, "Job complete");

        let images = job.image_paths.len();
        Ok(if resumed {
            JobOutcome::Resumed { images }
        } else {
            JobOutcome::Downloaded { images }
        })
    }
}
