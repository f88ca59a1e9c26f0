//! Document loading collaborator.
//!
//! The pipeline consumes raw text units through the [`DocumentLoader`]
//! trait; [`DirectoryLoader`] is the bundled implementation covering
//! PDF (via lopdf, one unit per page) and plain-text files. Anything
//! else is skipped with a warning - one bad file never fails a run.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// One raw text unit produced by a loader, before chunking.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Extracted text content.
    pub text: String,
    /// Provenance metadata. Always carries `source_file`; paged
    /// formats add a 1-indexed `page`.
    pub metadata: Map<String, Value>,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, source_file: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("source_file".to_string(), Value::from(source_file.into()));
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Attach an additional scalar metadata field.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Converts a directory of input files into raw text units.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load all supported documents under `dir`.
    ///
    /// Unsupported files are skipped (logged), never fatal. An
    /// unreadable directory is a fatal `Storage` error.
    async fn load(&self, dir: &Path) -> Result<Vec<RawDocument>>;
}

/// Directory loader for PDF and plain-text files.
#[derive(Debug, Default)]
pub struct DirectoryLoader;

impl DirectoryLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load(&self, dir: &Path) -> Result<Vec<RawDocument>> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        // Deterministic reading order regardless of directory iteration order
        entries.sort();

        let mut docs = Vec::new();
        for path in &entries {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();

            match ext.as_str() {
                "pdf" => match extract_pdf_pages(path, &file_name) {
                    Ok(pages) => docs.extend(pages),
                    Err(e) => {
                        tracing::warn!(file = %file_name, error = %e, "Skipping unreadable PDF");
                    }
                },
                "txt" | "md" => match std::fs::read_to_string(path) {
                    Ok(text) => docs.push(RawDocument::new(text, file_name.clone())),
                    Err(e) => {
                        tracing::warn!(file = %file_name, error = %e, "Skipping unreadable text file");
                    }
                },
                _ => {
                    tracing::warn!(file = %file_name, "Skipping unsupported file type");
                }
            }
        }

        tracing::info!(count = docs.len(), dir = %dir.display(), "Loaded documents");
        Ok(docs)
    }
}

/// Extract text from a PDF, one [`RawDocument`] per page.
fn extract_pdf_pages(path: &Path, file_name: &str) -> Result<Vec<RawDocument>> {
    let doc = lopdf::Document::load(path).map_err(|e| PipelineError::UnsupportedFormat {
        file: file_name.to_string(),
        reason: e.to_string(),
    })?;

    let mut pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    pages.sort();

    let mut out = Vec::with_capacity(pages.len());
    for (i, page_num) in pages.iter().enumerate() {
        let page_text = doc.extract_text(&[*page_num]).unwrap_or_default();
        out.push(
            RawDocument::new(page_text, file_name).with_field("page", (i + 1) as u64),
        );
    }

    tracing::debug!(file = %file_name, pages = out.len(), "Extracted PDF");
    Ok(out)
}
