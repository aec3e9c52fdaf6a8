//! Domain layer - conversation history and tool value objects.

pub mod conversation;
pub mod tools;
