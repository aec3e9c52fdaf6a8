//! Tool Handler Port - interface for the actual data-retrieval functions.
//!
//! The engine never looks inside a handler: it validates arguments against
//! the declared schema, invokes, and records the outcome. Handlers return
//! a serializable [`ToolValue`] or a descriptive failure; both re-enter
//! the conversation as tool messages.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::tools::ToolValue;

/// Port for executing one tool.
///
/// Implementations are the concrete query functions (invoice lookups,
/// employee lists, stock levels). Arguments arrive already parsed and
/// schema-checked; handlers may still reject them on deeper grounds.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Executes the tool with parsed parameters.
    async fn invoke(&self, parameters: serde_json::Value) -> Result<ToolValue, ToolError>;
}

/// Descriptive failures a handler may signal.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Arguments passed schema validation but are semantically invalid.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Any other execution failure.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Creates a generic execution failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates a not-found failure.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
