//! Tools module - definitions, result values, validation, and audit records.

mod definition;
mod invocation;
pub mod schema;
mod value;

pub use definition::ToolDefinition;
pub use invocation::{InvocationStatus, ToolInvocationRecord};
pub use schema::{validate_parameters, SchemaError};
pub use value::ToolValue;
