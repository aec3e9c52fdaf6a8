//! Message types for the conversation history.
//!
//! A message is one entry in the ordered conversation: system instructions,
//! user input, an assistant reply (optionally carrying tool-call requests),
//! or a tool result paired back to the call that produced it.

use serde::{Deserialize, Serialize};

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior, pinned during trimming).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
    /// Result of a tool invocation, paired to a tool call by id.
    Tool,
}

/// A model-issued request to invoke a tool.
///
/// The id is opaque and provider-assigned; arguments arrive as raw text
/// and are only parsed at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call identifier
    id: String,

    /// Name of the tool to invoke
    name: String,

    /// Raw argument text (JSON, unparsed)
    arguments: String,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Returns the provider-assigned call id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw argument text.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
    /// Tool calls requested by the model (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Id of the originating call (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Creates a new message with no tool-call payload.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates an assistant message carrying tool-call requests.
    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool-result message paired to the originating call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns true if this assistant message requests tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Estimated token size of this message.
    ///
    /// Heuristic, not a tokenizer: 4 tokens of per-message overhead plus
    /// 1.5 tokens per whitespace-separated word of content, in integer
    /// arithmetic. The same function is used everywhere budget trimming
    /// is decided, so trimming triggers deterministically.
    pub fn estimated_tokens(&self) -> u32 {
        let words = self.content.split_whitespace().count() as u32;
        4 + words * 3 / 2
    }
}
