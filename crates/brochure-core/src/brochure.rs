//! Brochure data model and persistence.
//!
//! The brochure is the structured output of summarization: seven
//! required sections plus generation provenance. It is persisted as a
//! single JSON document inside the job directory with full-overwrite
//! semantics; the write goes through a temp file and rename so a
//! failed write never leaves a partial brochure behind.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::jobs::Job;

/// Structured brochure content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brochure {
    pub title: String,
    pub subtitle: String,
    pub intro_summary: String,
    pub key_features: Vec<KeyFeature>,
    pub competitive_advantages: Vec<Advantage>,
    pub how_it_works: Vec<Step>,
    pub additional_insights: String,
    /// Generation provenance. Attached by the summarization stage,
    /// never supplied by the generation collaborator.
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BrochureMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFeature {
    pub feature: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advantage {
    pub advantage: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step: u32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrochureMetadata {
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub chunks_processed: usize,
}

impl Brochure {
    /// Validate required invariants and repair ordering only.
    ///
    /// `how_it_works` is sorted by step number ascending (an ordering
    /// repair, not fabrication). An empty title or a non-positive
    /// step number is a `Generation` error - missing values are never
    /// guessed.
    pub fn validate(mut self) -> Result<Self> {
        if self.title.trim().is_empty() {
            return Err(PipelineError::Generation(
                "brochure title is empty".to_string(),
            ));
        }
        if self.how_it_works.iter().any(|s| s.step == 0) {
            return Err(PipelineError::Generation(
                "how_it_works contains a non-positive step number".to_string(),
            ));
        }
        self.how_it_works.sort_by_key(|s| s.step);
        Ok(self)
    }
}

/// Write the brochure to the job directory, creating parent
/// directories if absent. Full overwrite: either the complete new
/// document lands or the previous one stays intact.
pub fn save_brochure(job: &Job, brochure: &Brochure) -> Result<PathBuf> {
    let path = job.brochure_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let raw = serde_json::to_string_pretty(brochure)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, &path)?;

    tracing::info!(job_id = %job.id(), path = %path.display(), "Saved brochure");
    Ok(path)
}

/// Load the job's brochure. `Ok(None)` means summarization has not
/// run yet - callers must not treat that as an error.
pub fn load_brochure(job: &Job) -> Result<Option<Brochure>> {
    let path = job.brochure_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let brochure = serde_json::from_str(&raw).map_err(|e| {
        PipelineError::Generation(format!("corrupt brochure file for job {}: {e}", job.id()))
    })?;
    Ok(Some(brochure))
}
