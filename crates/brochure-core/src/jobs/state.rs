//! Explicit per-job state, persisted alongside the job's artifacts.
//!
//! Status lives in `state.json` and is transitioned only by the stage
//! that owns the transition (ingest -> Chunked, summarize ->
//! Summarized, render -> Rendered). This replaces inferring progress
//! from which artifact files happen to exist, which breaks down under
//! partial failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Job;
use crate::error::Result;

/// Where a job is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Directory allocated, no artifacts yet.
    Created,
    /// Chunk records persisted; ready for summarization.
    Chunked,
    /// Brochure persisted; ready for rendering.
    Summarized,
    /// Rendered artifact written by a rendering collaborator.
    Rendered,
    /// The owning stage failed; see `error`. Artifacts from earlier
    /// stages remain valid, so re-running the failed stage recovers.
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Created => write!(f, "created"),
            JobStatus::Chunked => write!(f, "chunked"),
            JobStatus::Summarized => write!(f, "summarized"),
            JobStatus::Rendered => write!(f, "rendered"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Persisted job state record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobState {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            updated_at: Utc::now(),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            status: JobStatus::Failed,
            updated_at: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

pub(super) fn read(job: &Job) -> Result<JobState> {
    let path = job.state_path();
    if !path.exists() {
        // Jobs created before the explicit-state redesign.
        return Ok(JobState::new(JobStatus::Created));
    }
    let raw = std::fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("corrupt state file for job {}: {e}", job.id()),
        )
        .into()
    })
}

pub(super) fn write(job: &Job, state: JobState) -> Result<()> {
    let raw = serde_json::to_string_pretty(&state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(job.state_path(), raw)?;
    tracing::debug!(job_id = %job.id(), status = %state.status, "Job state updated");
    Ok(())
}
