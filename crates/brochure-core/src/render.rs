//! Rendering stage hand-off.
//!
//! The core does not typeset anything. It loads the persisted
//! brochure, hands it to a [`Renderer`] collaborator, and writes the
//! returned artifact bytes into the job directory.

use std::path::PathBuf;

use crate::brochure::load_brochure;
use crate::error::{PipelineError, Result};
use crate::jobs::{Job, JobLock, JobStatus};
use crate::providers::Renderer;

/// Render the job's brochure into an artifact file.
///
/// Fails with `NotFound` when summarization has not produced a
/// brochure yet. Returns the artifact path.
pub async fn render_job(job: &Job, renderer: &dyn Renderer) -> Result<PathBuf> {
    let _lock = JobLock::acquire(job)?;

    let brochure = load_brochure(job)?.ok_or_else(|| {
        PipelineError::NotFound(format!("no brochure for job {} - run summarize first", job.id()))
    })?;

    let bytes = match renderer.render(&brochure).await {
        Ok(bytes) => bytes,
        Err(e) => {
            job.record_failure(&e.to_string())?;
            return Err(e);
        }
    };

    let path = job.rendered_path();
    if let Err(e) = std::fs::write(&path, &bytes) {
        let e = PipelineError::from(e);
        job.record_failure(&e.to_string())?;
        return Err(e);
    }
    job.set_status(JobStatus::Rendered)?;

    tracing::info!(job_id = %job.id(), bytes = bytes.len(), path = %path.display(), "Rendered brochure");
    Ok(path)
}
