//! Job registry and per-job storage.
//!
//! A job is one end-to-end unit of pipeline work. Each job owns a
//! directory under the configured jobs root, named by its identifier:
//!
//! ```text
//! <jobs_root>/<job_id>/
//!   chunks.jsonl       line-delimited chunk records
//!   state.json         explicit job state
//!   brochure.json      structured brochure (after summarization)
//!   embeddings.jsonl   opaque embedding artifact (optional)
//!   brochure.pdf       rendered artifact (optional)
//!   .lock              advisory lock, present only while a writer runs
//! ```
//!
//! Identifiers are timestamp-prefixed (`YYYYmmdd_HHMMSS_`) with an
//! 8-hex random disambiguator, so lexicographic order is creation
//! order and two jobs created in the same second never collide.

mod lock;
mod state;

pub use lock::JobLock;
pub use state::{JobState, JobStatus};

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const BROCHURE_FILE: &str = "brochure.json";
pub const STATE_FILE: &str = "state.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.jsonl";
pub const RENDERED_FILE: &str = "brochure.pdf";
const LOCK_FILE: &str = ".lock";

/// A located job: identifier plus its exclusively owned directory.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    dir: PathBuf,
}

impl Job {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.dir.join(CHUNKS_FILE)
    }

    pub fn brochure_path(&self) -> PathBuf {
        self.dir.join(BROCHURE_FILE)
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.dir.join(EMBEDDINGS_FILE)
    }

    pub fn rendered_path(&self) -> PathBuf {
        self.dir.join(RENDERED_FILE)
    }

    pub(crate) fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    pub(crate) fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Read the persisted job state. A job directory without a state
    /// file reads as freshly created.
    pub fn state(&self) -> Result<JobState> {
        state::read(self)
    }

    /// Transition the job to `status`, clearing any recorded error.
    /// Only the stage that owns the transition calls this.
    pub fn set_status(&self, status: JobStatus) -> Result<()> {
        state::write(self, JobState::new(status))
    }

    /// Record a stage failure without discarding existing artifacts.
    pub fn record_failure(&self, error: &str) -> Result<()> {
        state::write(self, JobState::failed(error))
    }
}

/// Allocates job identifiers and resolves existing ones.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    root: PathBuf,
}

impl JobRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh job with a unique identifier and its own
    /// directory. Fails with a `Storage` error when the directory
    /// cannot be created; a pre-existing directory for a fresh id is
    /// treated as a collision and is not retried.
    pub fn create_job(&self) -> Result<Job> {
        std::fs::create_dir_all(&self.root)?;

        let disambiguator = Uuid::new_v4().simple().to_string();
        let id = format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &disambiguator[..8]
        );
        let dir = self.root.join(&id);

        // create_dir (not create_dir_all) so an id collision surfaces
        // as AlreadyExists instead of silently sharing a directory.
        std::fs::create_dir(&dir)?;

        let job = Job { id, dir };
        job.set_status(JobStatus::Created)?;

        tracing::info!(job_id = %job.id, dir = %job.dir.display(), "Created job");
        Ok(job)
    }

    /// List existing job identifiers, newest first. Identifiers are
    /// timestamp-prefixed, so reverse lexicographic order is reverse
    /// creation order.
    pub fn list_jobs(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = std::fs::read_dir(&self.root)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// Resolve an identifier to its job. Does not validate directory
    /// contents, but rejects identifiers that don't match the
    /// `YYYYmmdd_HHMMSS_<hex>` shape - the id becomes a path segment,
    /// and anything with separators could escape the jobs root.
    pub fn locate_job(&self, job_id: &str) -> Result<Job> {
        if !is_valid_job_id(job_id) {
            return Err(PipelineError::NotFound(format!("job {job_id}")));
        }
        let dir = self.root.join(job_id);
        if !dir.is_dir() {
            return Err(PipelineError::NotFound(format!("job {job_id}")));
        }
        Ok(Job {
            id: job_id.to_string(),
            dir,
        })
    }
}

/// `YYYYmmdd_HHMMSS_` followed by an 8-hex disambiguator.
fn is_valid_job_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 24 || bytes[8] != b'_' || bytes[15] != b'_' {
        return false;
    }
    bytes[..8].iter().chain(&bytes[9..15]).all(u8::is_ascii_digit)
        && bytes[16..].iter().all(u8::is_ascii_hexdigit)
}
