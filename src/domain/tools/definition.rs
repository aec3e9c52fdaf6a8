//! Tool definition - schema and metadata for an invocable tool.

use serde::{Deserialize, Serialize};

/// Definition of a tool the model may invoke.
///
/// Carries the name, description, and parameter JSON Schema handed to the
/// provider, plus the read-only marker that drives dispatch concurrency:
/// read-only calls in one round may run in parallel, mutating calls never
/// run concurrently with anything else.
///
/// # Examples
///
/// ```
/// use erp_copilot::domain::tools::ToolDefinition;
///
/// let definition = ToolDefinition::new(
///     "get_sales_invoices",
///     "Get sales invoices within a posting-date range",
///     serde_json::json!({
///         "type": "object",
///         "required": ["start_date", "end_date"],
///         "properties": {
///             "start_date": { "type": "string", "description": "Start date in YYYY-MM-DD format" },
///             "end_date": { "type": "string", "description": "End date in YYYY-MM-DD format" }
///         }
///     }),
/// );
/// assert!(definition.is_read_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "get_sales_invoices")
    name: String,

    /// Human-readable description for the model
    description: String,

    /// JSON Schema for the parameters
    parameters_schema: serde_json::Value,

    /// Whether the tool only reads data
    read_only: bool,
}

impl ToolDefinition {
    /// Creates a new read-only tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            read_only: true,
        }
    }

    /// Marks the tool as mutating; it will never execute concurrently.
    pub fn mutating(mut self) -> Self {
        self.read_only = false;
        self
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters schema.
    pub fn parameters_schema(&self) -> &serde_json::Value {
        &self.parameters_schema
    }

    /// Returns true if the tool only reads data.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Converts to the OpenAI function-calling wire format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema
            }
        })
    }
}
