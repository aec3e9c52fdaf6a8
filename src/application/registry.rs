//! Tool Registry - immutable mapping of tool name to schema and handler.
//!
//! Built once at startup through the builder; the finished registry is
//! read-only and shared process-wide across requests, so no locking is
//! needed. Definitions are listed in registration order, which is the
//! order the provider sees them in.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::tools::ToolDefinition;
use crate::ports::ToolHandler;

/// Errors raised while building the registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// A registered tool: its definition plus the handler capability.
#[derive(Clone)]
pub struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// Returns the tool definition.
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Returns a shared handle to the handler.
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

/// Builder for the registry; the only place registration happens.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryBuilder")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl ToolRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; fails if the name is already taken.
    pub fn register(
        mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, RegistryError> {
        let name = definition.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.order.push(name.clone());
        self.tools.insert(
            name,
            RegisteredTool {
                definition,
                handler,
            },
        );
        Ok(self)
    }

    /// Freezes the builder into a read-only registry.
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            order: self.order,
        }
    }
}

/// Read-only registry of invocable tools.
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Starts a new registry builder.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Looks up a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Checks if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition.clone())
            .collect()
    }

    /// Definitions in the OpenAI function-calling wire format.
    pub fn openai_tools(&self) -> Vec<serde_json::Value> {
        self.definitions()
            .iter()
            .map(|definition| definition.to_openai_format())
            .collect()
    }

    /// Returns the number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
