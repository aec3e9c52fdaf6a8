//! Ports - capability interfaces between the engine and its collaborators.

mod model_client;
mod tool_handler;

pub use model_client::{Completion, ModelClient, ModelError};
pub use tool_handler::{ToolError, ToolHandler};
