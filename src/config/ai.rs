//! AI provider and orchestration configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration plus loop limits
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Token budget the conversation is trimmed to
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: u32,

    /// Maximum completion rounds per ask
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient provider failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Per-tool-call execution timeout in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Bound on concurrently executing read-only tool calls
    #[serde(default = "default_parallel_calls")]
    pub max_parallel_calls: usize,
}

impl AiConfig {
    /// Get provider request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get per-call timeout as Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if self.max_rounds == 0 {
            return Err(ValidationError::InvalidRoundLimit);
        }
        if self.max_context_tokens == 0 {
            return Err(ValidationError::InvalidContextBudget);
        }
        if self.timeout_secs == 0 || self.call_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_parallel_calls == 0 {
            return Err(ValidationError::InvalidParallelism);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            max_context_tokens: default_max_context_tokens(),
            max_rounds: default_max_rounds(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            call_timeout_secs: default_call_timeout(),
            max_parallel_calls: default_parallel_calls(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_context_tokens() -> u32 {
    8000
}

fn default_max_rounds() -> u32 {
    5
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_call_timeout() -> u64 {
    30
}

fn default_parallel_calls() -> usize {
    4
}
