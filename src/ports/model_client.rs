//! Model Client Port - boundary to the chat-completion provider.
//!
//! The orchestration loop only ever sees this trait: it hands over the
//! conversation plus the available tool definitions and gets back either a
//! final message or a list of requested tool calls. Retries for transient
//! provider failures live behind the boundary, so they are invisible to
//! the loop's round counter. A deterministic stub replaces the network
//! implementation in tests.

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, ToolCallRequest};
use crate::domain::tools::ToolDefinition;

/// Port for chat-completion providers.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Requests one completion for the conversation.
    ///
    /// `tools` is the ordered list of definitions the provider may choose
    /// from; an empty slice means tool calling is unavailable this round.
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Completion, ModelError>;
}

/// Outcome of one completion round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The model produced a final message; the loop is done.
    Final { content: String },
    /// The model requested tool calls, optionally alongside partial text.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
}

impl Completion {
    /// Creates a final completion.
    pub fn final_message(content: impl Into<String>) -> Self {
        Completion::Final {
            content: content.into(),
        }
    }

    /// Creates a tool-call completion with no partial text.
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Completion::ToolCalls {
            content: None,
            calls,
        }
    }
}

/// Model provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// API key missing or rejected; fatal, never retried.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable (5xx).
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider rejected the request shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ModelError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::RateLimited { .. }
                | ModelError::Unavailable { .. }
                | ModelError::Timeout { .. }
                | ModelError::Network(_)
        )
    }
}
