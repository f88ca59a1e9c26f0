//! Summarization stage.
//!
//! Reads a job's chunks, assembles a bounded context, asks the
//! generation collaborator for brochure JSON, parses it strictly, and
//! persists the result with provenance metadata. A malformed response
//! fails loudly with a `Generation` error and writes nothing; the
//! caller decides whether to retry by invoking `summarize` again.

use std::sync::Arc;

use chrono::Utc;

use crate::brochure::{save_brochure, Brochure, BrochureMetadata};
use crate::chunking::Chunk;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::jobs::{Job, JobLock, JobStatus};
use crate::providers::Generator;
use crate::store::read_all;

/// JSON shape the generation collaborator must follow.
const SCHEMA_HINT: &str = r#"{
    "title": "<Title>",
    "subtitle": "<Subtitle>",
    "intro_summary": "<Intro paragraph>",
    "key_features": [
        {"feature": "<Feature>", "description": "<Description>"}
    ],
    "competitive_advantages": [
        {"advantage": "<Advantage>", "explanation": "<Explanation>"}
    ],
    "how_it_works": [
        {"step": 1, "title": "<Step title>", "description": "<Description>"}
    ],
    "additional_insights": "<Additional info>"
}"#;

/// Produces a structured brochure from a job's persisted chunks.
pub struct Summarizer {
    config: Config,
    generator: Arc<dyn Generator>,
}

impl Summarizer {
    pub fn new(config: Config, generator: Arc<dyn Generator>) -> Self {
        Self { config, generator }
    }

    /// Summarize the job's chunks into a brochure and persist it.
    ///
    /// Fails with `NotFound` when the job has no usable chunks
    /// (summarization cannot run before ingestion). Subsequent runs
    /// for the same job overwrite the previous brochure.
    pub async fn summarize(&self, job: &Job) -> Result<Brochure> {
        let _lock = JobLock::acquire(job)?;

        let (chunks, skipped) = read_all(job)?;
        if skipped > 0 {
            tracing::warn!(job_id = %job.id(), skipped, "Some chunk lines were unreadable");
        }
        if chunks.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "no chunks available for job {}",
                job.id()
            )));
        }

        match self.generate_and_persist(job, &chunks).await {
            Ok(brochure) => {
                job.set_status(JobStatus::Summarized)?;
                Ok(brochure)
            }
            Err(e) => {
                // Chunks stay intact; re-running summarize recovers.
                job.record_failure(&e.to_string())?;
                Err(e)
            }
        }
    }

    async fn generate_and_persist(&self, job: &Job, chunks: &[Chunk]) -> Result<Brochure> {
        let context = build_context(chunks, self.config.max_context_chars);
        let prompt = build_prompt(&context);

        tracing::info!(
            job_id = %job.id(),
            chunks = chunks.len(),
            context_chars = context.chars().count(),
            model = %self.generator.model_id(),
            "Generating brochure"
        );

        let raw = self.generator.generate(&prompt, SCHEMA_HINT).await?;

        // Strict parse: unparseable or schema-violating output
        // propagates, and nothing is written to disk.
        let brochure: Brochure = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Generation(format!("model response is not valid brochure JSON: {e}"))
        })?;
        let mut brochure = brochure.validate()?;

        brochure.metadata = Some(BrochureMetadata {
            generated_at: Utc::now(),
            model: self.generator.model_id().to_string(),
            chunks_processed: chunks.len(),
        });

        save_brochure(job, &brochure)?;
        Ok(brochure)
    }
}

/// Concatenate chunk texts into a single context string bounded by
/// `max_chars`.
///
/// Each chunk is introduced by an ordinal delimiter. A piece that
/// would overflow the budget is truncated to exactly the remaining
/// budget (on a char boundary) and assembly stops, so the result is
/// deterministic regardless of chunk count.
fn build_context(chunks: &[Chunk], max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut total = 0usize;

    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.text.trim().is_empty() {
            continue;
        }

        let piece = format!("--- Chunk {} ---\n{}\n", i + 1, chunk.text);
        let piece_len = piece.chars().count();

        if total + piece_len > max_chars {
            let remaining = max_chars - total;
            parts.push(piece.chars().take(remaining).collect());
            break;
        }

        parts.push(piece);
        total += piece_len;
    }

    parts.join("\n")
}

fn build_prompt(context: &str) -> String {
    format!(
        "You are a professional brochure writer and marketing expert.\n\
         Based on the following text content, create a clear, professional, \
         and engaging brochure with these sections:\n\n\
         1. Title (max 10 words)\n\
         2. Subtitle (max 15 words)\n\
         3. Introduction Summary (3-4 sentences)\n\
         4. Key Product Features (4-6 items)\n\
         5. Competitive Advantages (4-6 items)\n\
         6. How It Works (3-5 steps)\n\
         7. Additional Insights (other relevant info)\n\n\
         Ensure the output is valid JSON only, following this structure:\n\
         {SCHEMA_HINT}\n\n\
         Document Content:\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn context_tags_ordinal_positions() {
        let context = build_context(&[chunk("alpha"), chunk("beta")], 10_000);
        assert!(context.contains("--- Chunk 1 ---\nalpha"));
        assert!(context.contains("--- Chunk 2 ---\nbeta"));
    }

    #[test]
    fn context_respects_budget() {
        let chunks: Vec<Chunk> = (0..50).map(|_| chunk(&"x".repeat(100))).collect();
        let budget = 500;
        let context = build_context(&chunks, budget);
        // Pieces are joined with one extra newline each; the budget
        // bounds the pieces themselves.
        let piece_chars: usize = context.chars().count() - context.matches("\n\n").count();
        assert!(piece_chars <= budget);
        assert!(context.starts_with("--- Chunk 1 ---"));
    }

    #[test]
    fn overflowing_piece_is_truncated_not_dropped() {
        let first = chunk(&"a".repeat(80));
        let second = chunk(&"b".repeat(500));
        let context = build_context(&[first, second], 150);
        // The second piece appears, cut to the remaining budget.
        assert!(context.contains("--- Chunk 2 ---"));
        assert!(context.contains('b'));
        let b_count = context.chars().filter(|&c| c == 'b').count();
        assert!(b_count < 500);
    }

    #[test]
    fn whitespace_chunks_are_skipped_in_context() {
        let context = build_context(&[chunk("  \n "), chunk("real")], 1000);
        assert!(context.contains("--- Chunk 2 ---\nreal"));
        assert!(!context.contains("--- Chunk 1 ---"));
    }
}
