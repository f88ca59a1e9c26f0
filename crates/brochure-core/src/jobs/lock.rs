//! Advisory per-job write lock.
//!
//! Every stage that mutates a job's artifacts acquires the lock
//! first. The lock is a `.lock` file created with `create_new`, so a
//! second concurrent writer gets a detectable `JobLocked` error
//! instead of racing on the artifacts. Single-writer is the supported
//! model; this exists to reject violations, not to queue them.
//!
//! The lock file is removed when the guard drops. A process that dies
//! while holding the lock leaves the file behind; clearing stale
//! locks is an operator action.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::jobs::Job;

/// RAII guard over a job's advisory lock file.
#[derive(Debug)]
pub struct JobLock {
    path: PathBuf,
    job_id: String,
}

impl JobLock {
    /// Acquire the lock for `job`, failing with `JobLocked` when
    /// another writer already holds it.
    pub fn acquire(job: &Job) -> Result<Self> {
        let path = job.lock_path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Record the owning pid to help operators diagnose
                // stale locks.
                let _ = writeln!(file, "{}", std::process::id());
                tracing::debug!(job_id = %job.id(), "Acquired job lock");
                Ok(Self {
                    path,
                    job_id: job.id().to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(PipelineError::JobLocked {
                    job_id: job.id().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to release job lock");
        }
    }
}
