//! OpenAI-backed collaborator implementations.
//!
//! [`OpenAiGenerator`] drives chat completions in JSON mode;
//! [`OpenAiEmbedder`] produces embedding vectors and persists them as
//! an opaque artifact inside the job directory.

use std::io::{BufWriter, Write};

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    types::embeddings::CreateEmbeddingRequestArgs,
    Client,
};
use async_trait::async_trait;
use serde_json::json;

use super::{EmbeddingBackend, EmbeddingIndex, Generator};
use crate::chunking::Chunk;
use crate::error::{PipelineError, Result};
use crate::jobs::Job;

/// Map an OpenAI client error onto the pipeline taxonomy.
fn map_openai_error(e: OpenAIError) -> PipelineError {
    match e {
        OpenAIError::ApiError(api) => {
            let code = api.code.as_deref().unwrap_or_default();
            if code == "rate_limit_exceeded" {
                PipelineError::RateLimited(api.message)
            } else if code == "invalid_api_key" {
                PipelineError::Credential(api.message)
            } else {
                PipelineError::Service(api.message)
            }
        }
        other => PipelineError::Service(other.to_string()),
    }
}

/// Chat-completion generator in strict-JSON mode.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, schema_hint: &str) -> Result<String> {
        let system = format!(
            "You are a professional brochure writer. Always return output \
             strictly as valid JSON only, following this structure:\n{schema_hint}"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(map_openai_error)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(map_openai_error)?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonObject)
            .max_completion_tokens(self.max_tokens)
            .temperature(0.7)
            .build()
            .map_err(map_openai_error)?;

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::Service("completion had no content".to_string()))?;

        tracing::debug!(model = %self.model, response_chars = content.len(), "Completion received");
        Ok(content)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Embedding backend writing vectors to `embeddings.jsonl` in the job
/// directory. The artifact is opaque to the rest of the pipeline.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str) -> Self {
        Self::with_model(api_key, "text-embedding-3-small")
    }

    pub fn with_model(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbedder {
    async fn embed(&self, job: &Job, chunks: &[Chunk]) -> Result<EmbeddingIndex> {
        let path = job.embeddings_path();
        if chunks.is_empty() {
            std::fs::write(&path, "")?;
            return Ok(EmbeddingIndex {
                path,
                vector_count: 0,
            });
        }

        let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(inputs)
            .build()
            .map_err(map_openai_error)?;

        tracing::info!(job_id = %job.id(), count = chunks.len(), model = %self.model, "Generating embeddings");

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let mut writer = BufWriter::new(std::fs::File::create(&path)?);
        let mut vector_count = 0;
        for data in &response.data {
            let record = json!({
                "index": data.index,
                "model": self.model,
                "embedding": data.embedding,
            });
            writer.write_all(record.to_string().as_bytes())?;
            writer.write_all(b"\n")?;
            vector_count += 1;
        }
        writer.flush()?;

        tracing::info!(job_id = %job.id(), vector_count, path = %path.display(), "Stored embeddings");
        Ok(EmbeddingIndex { path, vector_count })
    }
}
