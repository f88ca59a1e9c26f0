//! Collaborator interfaces for external capabilities.
//!
//! The pipeline core depends on document loading, embedding
//! generation, text generation, and rendering, but implements none of
//! them. Each sits behind a trait so deployments can swap backends
//! and tests can substitute fakes.

pub mod openai;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::brochure::Brochure;
use crate::chunking::Chunk;
use crate::error::Result;
use crate::jobs::Job;

pub use openai::{OpenAiEmbedder, OpenAiGenerator};

/// Text-generation collaborator: prompt in, structured text out.
///
/// Implementations surface `Service` for backend failures,
/// `RateLimited` when asked to slow down, and `Credential` for
/// rejected keys. They never parse or repair the output - that is the
/// summarization stage's job.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt`. `schema_hint` describes the JSON
    /// shape the caller expects; backends that support structured
    /// output modes may use it, others may ignore it.
    async fn generate(&self, prompt: &str, schema_hint: &str) -> Result<String>;

    /// Model identifier recorded in brochure provenance.
    fn model_id(&self) -> &str;
}

/// Opaque handle to a persisted embedding artifact.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    /// Where the artifact lives inside the job directory.
    pub path: PathBuf,
    /// Number of vectors produced.
    pub vector_count: usize,
}

/// Embedding collaborator: chunks in, opaque index handle out.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, job: &Job, chunks: &[Chunk]) -> Result<EmbeddingIndex>;
}

/// Rendering collaborator: finished brochure in, artifact bytes out.
///
/// Layout, typography, and content-padding heuristics are presentation
/// policy and belong entirely behind this interface.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, brochure: &Brochure) -> Result<Vec<u8>>;
}
