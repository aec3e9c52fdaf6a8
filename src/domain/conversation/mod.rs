//! Conversation module - message history and budget trimming.

mod history;
mod message;

pub use history::{Conversation, ConversationError};
pub use message::{Message, MessageRole, ToolCallRequest};
