//! Scripted model client for tests.
//!
//! Plays back a fixed sequence of completions (or errors) and records
//! every request it receives, so tests can assert on what the loop sent
//! to the provider round by round. No network involved.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, Message, ToolCallRequest};
use crate::domain::tools::ToolDefinition;
use crate::ports::{Completion, ModelClient, ModelError};

/// Snapshot of one request seen by the scripted client.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Conversation messages at the time of the call.
    pub messages: Vec<Message>,
    /// Names of the tool definitions offered.
    pub tool_names: Vec<String>,
}

/// Deterministic stand-in for the provider.
#[derive(Default)]
pub struct ScriptedModelClient {
    script: Mutex<VecDeque<Result<Completion, ModelError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl ScriptedModelClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a final-message completion.
    pub fn with_final(self, content: impl Into<String>) -> Self {
        self.with_completion(Completion::final_message(content))
    }

    /// Queues a completion requesting a single tool call.
    pub fn with_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        self.with_completion(Completion::tool_calls(vec![ToolCallRequest::new(
            id, name, arguments,
        )]))
    }

    /// Queues an arbitrary completion.
    pub fn with_completion(self, completion: Completion) -> Self {
        self.script.lock().unwrap().push_back(Ok(completion));
        self
    }

    /// Queues a model error.
    pub fn with_error(self, error: ModelError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Delays every completion, for deadline tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns all requests recorded so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Completion, ModelError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: conversation.messages().to_vec(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
        });

        let next = self.script.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Err(ModelError::unavailable("script exhausted")))
    }
}
