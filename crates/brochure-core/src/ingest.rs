//! Ingestion pipeline: documents in, persisted chunk records out.
//!
//! Orchestrates Document Loader -> Chunking -> Chunk Store for a
//! fresh job. Re-running ingest always creates a new job; prior jobs
//! are never overwritten (append-only by design).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::chunking::{split_documents, Chunk};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::jobs::{Job, JobLock, JobRegistry, JobStatus};
use crate::loader::DocumentLoader;
use crate::providers::EmbeddingBackend;
use crate::store::write_chunks;

/// Metadata returned once ingestion has persisted its chunks.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub job_id: String,
    pub job_dir: PathBuf,
    pub chunks_path: PathBuf,
    pub chunk_count: usize,
    pub embeddings_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings_path: Option<PathBuf>,
}

/// Orchestrates one ingestion run per call.
pub struct IngestPipeline {
    config: Config,
    registry: JobRegistry,
    loader: Arc<dyn DocumentLoader>,
    embedder: Option<Arc<dyn EmbeddingBackend>>,
}

impl IngestPipeline {
    pub fn new(config: Config, loader: Arc<dyn DocumentLoader>) -> Self {
        let registry = JobRegistry::new(&config.jobs_root);
        Self {
            config,
            registry,
            loader,
            embedder: None,
        }
    }

    /// Attach an embedding backend for `create_embeddings` runs.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Ingest all supported documents under `input_dir` into a new
    /// job: load, chunk, persist.
    ///
    /// When `create_embeddings` is set, the required backend and
    /// credential are checked before any expensive work; the chunks
    /// are then handed off after persistence, and an embedding
    /// failure at that point propagates without discarding the
    /// already-persisted chunk file.
    pub async fn ingest(&self, input_dir: &Path, create_embeddings: bool) -> Result<IngestReceipt> {
        self.config.validate()?;

        // Hard dependency check, before any expensive work.
        let embedder = if create_embeddings {
            self.config.require_api_key()?;
            Some(self.embedder.as_ref().ok_or_else(|| {
                PipelineError::Configuration(
                    "create_embeddings requested but no embedding backend attached".to_string(),
                )
            })?)
        } else {
            None
        };

        let job = self.registry.create_job()?;
        let _lock = JobLock::acquire(&job)?;

        let (chunks_path, chunks) = match self.chunk_and_persist(&job, input_dir).await {
            Ok(result) => result,
            Err(e) => {
                job.record_failure(&e.to_string())?;
                return Err(e);
            }
        };
        job.set_status(JobStatus::Chunked)?;

        let mut receipt = IngestReceipt {
            job_id: job.id().to_string(),
            job_dir: job.dir().to_path_buf(),
            chunks_path,
            chunk_count: chunks.len(),
            embeddings_created: false,
            embeddings_path: None,
        };

        if let Some(embedder) = embedder {
            // Chunks are already on disk; a failure here loses
            // nothing and the caller may retry embedding separately.
            let index = embedder.embed(&job, &chunks).await?;
            receipt.embeddings_created = true;
            receipt.embeddings_path = Some(index.path);
        }

        tracing::info!(
            job_id = %receipt.job_id,
            chunk_count = receipt.chunk_count,
            embeddings = receipt.embeddings_created,
            "Ingestion complete"
        );
        Ok(receipt)
    }

    async fn chunk_and_persist(
        &self,
        job: &Job,
        input_dir: &Path,
    ) -> Result<(PathBuf, Vec<Chunk>)> {
        let docs = self.loader.load(input_dir).await?;
        let chunks = split_documents(&docs, self.config.chunk_size, self.config.chunk_overlap)?;
        let chunks_path = write_chunks(job, &chunks)?;
        Ok((chunks_path, chunks))
    }
}
