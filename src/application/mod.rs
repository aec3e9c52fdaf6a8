//! Application layer: registry, dispatch, and the orchestration loop.

pub mod dispatcher;
pub mod orchestrator;
pub mod registry;

pub use dispatcher::{DispatchOutcome, DispatcherConfig, ToolDispatcher};
pub use orchestrator::{
    AskError, AskOutcome, Orchestrator, OrchestratorConfig, Termination,
};
pub use registry::{RegisteredTool, RegistryError, ToolRegistry, ToolRegistryBuilder};
