//! Brochure Core - job-oriented document-to-brochure pipeline
//!
//! This crate contains the pipeline core for brochure generation:
//! - Job registry and per-job storage (timestamped directories)
//! - Document loading (lopdf-backed, pluggable)
//! - Chunking into overlapping character windows
//! - Line-delimited chunk store with partial-corruption tolerance
//! - Summarization into a structured brochure via a generation
//!   collaborator
//! - Contracts for embedding and rendering collaborators
//!
//! Stages hand off through persisted artifacts keyed by job id, so
//! each stage can be re-run, resumed, or inspected independently.
//! Execution is single-job, sequential, and synchronous from the
//! caller's perspective: the core spawns no tasks and applies no
//! timeouts; cancellation and retries belong to the caller.

pub mod brochure;
pub mod chunking;
pub mod config;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod loader;
pub mod providers;
pub mod render;
pub mod store;
pub mod summarize;

pub use brochure::{load_brochure, save_brochure, Brochure, BrochureMetadata};
pub use chunking::{split_documents, Chunk};
pub use config::Config;
pub use error::{PipelineError, Result};
pub use ingest::{IngestPipeline, IngestReceipt};
pub use jobs::{Job, JobLock, JobRegistry, JobState, JobStatus};
pub use loader::{DirectoryLoader, DocumentLoader, RawDocument};
pub use providers::{
    EmbeddingBackend, EmbeddingIndex, Generator, OpenAiEmbedder, OpenAiGenerator, Renderer,
};
pub use render::render_job;
pub use summarize::Summarizer;
