//! Built-in tool handlers.

pub mod clock;

pub use clock::CurrentDateTool;
