//! Clock tool - reports the current date and time.
//!
//! The one tool every deployment gets for free. The model already sees
//! today's date in the system prompt; this tool gives it the exact
//! timestamp when a question needs one.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::domain::tools::{ToolDefinition, ToolValue};
use crate::ports::{ToolError, ToolHandler};

/// Returns the current UTC date and time.
pub struct CurrentDateTool;

impl CurrentDateTool {
    /// Definition offered to the model.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "current_date",
            "Get the current date and time in UTC",
            json!({
                "type": "object",
                "properties": {}
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for CurrentDateTool {
    async fn invoke(&self, _parameters: serde_json::Value) -> Result<ToolValue, ToolError> {
        Ok(ToolValue::Timestamp(Utc::now()))
    }
}
