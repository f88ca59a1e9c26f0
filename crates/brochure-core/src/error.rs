//! Pipeline error taxonomy.
//!
//! Every stage returns [`PipelineError`] so callers can tell apart
//! configuration mistakes (fail fast, fix and re-run), missing
//! artifacts (re-run the earlier stage), storage failures, and
//! collaborator failures (the caller decides whether to retry).

use thiserror::Error;

/// Errors surfaced by the brochure pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid parameters detected before any expensive work
    /// (bad chunk/overlap sizing, zero context budget, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A job, chunk file, or other required artifact does not exist.
    /// Recoverable by re-running the producing stage.
    #[error("not found: {0}")]
    NotFound(String),

    /// Directory or file access failed; surfaced verbatim.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A single input file could not be parsed. Loaders treat this
    /// as per-file and non-fatal: log, skip, continue.
    #[error("unsupported format in {file}: {reason}")]
    UnsupportedFormat { file: String, reason: String },

    /// Another writer holds the advisory lock for this job.
    #[error("job {job_id} is locked by another writer")]
    JobLocked { job_id: String },

    /// A required credential is missing or rejected.
    #[error("credential error: {0}")]
    Credential(String),

    /// A collaborator call failed (network, backend, ...).
    #[error("service error: {0}")]
    Service(String),

    /// The generation collaborator asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The generation collaborator returned unparseable or
    /// schema-violating content. Never silently repaired.
    #[error("generation error: {0}")]
    Generation(String),

    /// The rendering collaborator failed to produce an artifact.
    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
