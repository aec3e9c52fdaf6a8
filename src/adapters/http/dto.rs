//! Data transfer objects for the ask HTTP endpoint.

use serde::{Deserialize, Serialize};

use crate::application::Termination;
use crate::domain::conversation::{Message, MessageRole};
use crate::domain::tools::ToolInvocationRecord;

/// One caller-supplied conversation message.
///
/// Callers may only submit plain roles; tool plumbing (assistant
/// tool-call messages and tool results) is produced server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

impl MessageDto {
    /// Converts to a domain message; rejects unknown and tool roles.
    pub fn to_message(&self) -> Result<Message, String> {
        let role = match self.role.as_str() {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => return Err(format!("Invalid role: {}", other)),
        };
        Ok(Message::new(role, self.content.clone()))
    }
}

/// Request to run one ask over a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Prior conversation, oldest first, ending with the user's question.
    pub conversation: Vec<MessageDto>,
}

/// Final answer plus the tool audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer text (partial when the loop was cut short).
    pub content: String,
    /// Ordered record of every tool invocation.
    pub tool_usage: Vec<ToolInvocationRecord>,
    /// Completion rounds consumed.
    pub rounds: u32,
    /// Why the loop stopped.
    pub termination: Termination,
}

/// Standard error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_roles_convert() {
        for role in ["system", "user", "assistant"] {
            let dto = MessageDto {
                role: role.to_string(),
                content: "hi".to_string(),
            };
            assert!(dto.to_message().is_ok());
        }
    }

    #[test]
    fn tool_role_is_rejected_inbound() {
        let dto = MessageDto {
            role: "tool".to_string(),
            content: "[]".to_string(),
        };
        assert!(dto.to_message().is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let dto = MessageDto {
            role: "moderator".to_string(),
            content: "hi".to_string(),
        };
        let err = dto.to_message().unwrap_err();
        assert!(err.contains("moderator"));
    }
}
