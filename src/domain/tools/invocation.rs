//! Tool invocation record - audit entry for every executed call.
//!
//! One record is appended per requested call, success or failure, and the
//! ordered trail is returned to the caller alongside the final answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Error,
}

/// A recorded tool invocation.
///
/// Captures what was called, with which parsed parameters, what came back,
/// and how long it took. Recovered failures (bad arguments, unknown tool,
/// handler errors) are visible here and nowhere else in the final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    /// Unique identifier for this invocation
    id: Uuid,

    /// Name of the tool that was requested
    tool_name: String,

    /// Parsed parameters (an empty object when parsing failed)
    parameters: serde_json::Value,

    /// Outcome of the execution
    status: InvocationStatus,

    /// Short description of the result
    result_summary: String,

    /// Error detail (present only on failure)
    error: Option<String>,

    /// When the call was started
    invoked_at: DateTime<Utc>,

    /// Execution duration in milliseconds
    duration_ms: u32,
}

impl ToolInvocationRecord {
    /// Records a successful invocation.
    pub fn success(
        tool_name: impl Into<String>,
        parameters: serde_json::Value,
        result_summary: impl Into<String>,
        invoked_at: DateTime<Utc>,
        duration_ms: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            parameters,
            status: InvocationStatus::Success,
            result_summary: result_summary.into(),
            error: None,
            invoked_at,
            duration_ms,
        }
    }

    /// Records a failed invocation.
    pub fn failure(
        tool_name: impl Into<String>,
        parameters: serde_json::Value,
        error: impl Into<String>,
        invoked_at: DateTime<Utc>,
        duration_ms: u32,
    ) -> Self {
        let error = error.into();
        Self {
            id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            parameters,
            status: InvocationStatus::Error,
            result_summary: error.clone(),
            error: Some(error),
            invoked_at,
            duration_ms,
        }
    }

    /// Returns the unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the tool name.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the parsed parameters.
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Returns the execution status.
    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    /// Returns the result summary.
    pub fn result_summary(&self) -> &str {
        &self.result_summary
    }

    /// Returns the error detail, if the invocation failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns when the call started.
    pub fn invoked_at(&self) -> DateTime<Utc> {
        self.invoked_at
    }

    /// Returns the execution duration in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Returns true if the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_record_has_no_error() {
        let record = ToolInvocationRecord::success(
            "get_customers",
            json!({"limit": 3}),
            "3 rows",
            Utc::now(),
            12,
        );

        assert!(record.is_success());
        assert_eq!(record.status(), InvocationStatus::Success);
        assert_eq!(record.result_summary(), "3 rows");
        assert!(record.error().is_none());
        assert_eq!(record.duration_ms(), 12);
    }

    #[test]
    fn failure_record_mirrors_error_into_summary() {
        let record = ToolInvocationRecord::failure(
            "get_foo",
            json!({}),
            "UnknownTool: get_foo",
            Utc::now(),
            0,
        );

        assert!(!record.is_success());
        assert_eq!(record.error(), Some("UnknownTool: get_foo"));
        assert_eq!(record.result_summary(), "UnknownTool: get_foo");
    }

    #[test]
    fn ids_are_unique() {
        let a = ToolInvocationRecord::success("t", json!({}), "ok", Utc::now(), 1);
        let b = ToolInvocationRecord::success("t", json!({}), "ok", Utc::now(), 1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn status_serializes_lowercase() {
        let record =
            ToolInvocationRecord::success("get_customers", json!({}), "ok", Utc::now(), 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"success\""));
    }
}
