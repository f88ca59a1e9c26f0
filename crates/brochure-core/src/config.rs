//! Pipeline configuration.
//!
//! An explicit configuration object passed into each stage at
//! construction. No stage reads process-wide state on its own; the
//! binary resolves the environment once and hands the result down.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Configuration shared by all pipeline stages.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the hosted generation/embedding service.
    /// `None` is valid until a stage actually needs it.
    pub api_key: Option<String>,
    /// Model identifier passed to the generation collaborator.
    pub model_name: String,
    /// Character budget for the summarization context.
    pub max_context_chars: usize,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Root directory holding one subdirectory per job.
    pub jobs_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let jobs_root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("brochure")
            .join("jobs");

        Self {
            api_key: None,
            model_name: "gpt-4o-mini".to_string(),
            max_context_chars: 50_000,
            chunk_size: 1000,
            chunk_overlap: 200,
            jobs_root,
        }
    }
}

impl Config {
    /// Build a config from the process environment, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `BROCHURE_MODEL`,
    /// `BROCHURE_JOBS_ROOT`, `BROCHURE_MAX_CONTEXT_CHARS`,
    /// `BROCHURE_CHUNK_SIZE`, `BROCHURE_CHUNK_OVERLAP`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            model_name: std::env::var("BROCHURE_MODEL").unwrap_or(defaults.model_name),
            max_context_chars: env_usize("BROCHURE_MAX_CONTEXT_CHARS")
                .unwrap_or(defaults.max_context_chars),
            chunk_size: env_usize("BROCHURE_CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            chunk_overlap: env_usize("BROCHURE_CHUNK_OVERLAP").unwrap_or(defaults.chunk_overlap),
            jobs_root: std::env::var("BROCHURE_JOBS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_root),
        }
    }

    /// Validate stage parameters before any expensive work.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Configuration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(PipelineError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_context_chars == 0 {
            return Err(PipelineError::Configuration(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The API key, or a `Credential` error when absent.
    ///
    /// Stages that talk to hosted services call this before doing
    /// anything expensive.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Credential("OPENAI_API_KEY not set in environment".to_string())
        })
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let config = Config {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn missing_api_key_is_a_credential_error() {
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        assert!(matches!(
            config.require_api_key(),
            Err(PipelineError::Credential(_))
        ));
    }
}
