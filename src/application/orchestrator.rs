//! Orchestrator - the multi-round ask loop.
//!
//! Drives alternating completion and dispatch rounds until the model
//! produces a final message or a guard fires. The round cap and the
//! optional deadline end the loop gracefully with whatever partial
//! content the model produced along the way; only structural
//! conversation errors and model failures surface as errors.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::conversation::{Conversation, ConversationError, Message};
use crate::domain::tools::ToolInvocationRecord;
use crate::ports::{Completion, ModelClient, ModelError};

use super::dispatcher::{DispatcherConfig, ToolDispatcher};
use super::registry::ToolRegistry;

/// Orchestration tuning knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum completion rounds per ask.
    pub max_rounds: u32,
    /// Token budget the conversation is trimmed to before each completion.
    pub max_context_tokens: u32,
    /// Optional wall-clock deadline for the whole ask.
    pub request_deadline: Option<Duration>,
    /// Dispatcher settings for tool rounds.
    pub dispatcher: DispatcherConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            max_context_tokens: 8000,
            request_deadline: None,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

/// Why the ask loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model produced a final message.
    Completed,
    /// The round cap fired before a final message.
    MaxRoundsExceeded,
    /// The deadline fired between rounds.
    DeadlineExceeded,
}

/// Final result of one ask.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// Answer text. When the loop was cut short this is the last partial
    /// assistant text, possibly empty.
    pub content: String,
    /// Ordered audit trail of every tool invocation across all rounds.
    pub tool_usage: Vec<ToolInvocationRecord>,
    /// Completion rounds consumed.
    pub rounds: u32,
    /// Why the loop stopped.
    pub termination: Termination,
}

impl AskOutcome {
    /// Returns true if the model finished on its own.
    pub fn completed(&self) -> bool {
        self.termination == Termination::Completed
    }
}

/// Errors that abort an ask.
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    /// The conversation is structurally invalid or cannot fit the budget.
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// The model client failed after exhausting its own retries.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Loop phase, for tracing.
enum LoopState {
    AwaitingModel,
    DispatchingTools,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::AwaitingModel => write!(f, "awaiting_model"),
            LoopState::DispatchingTools => write!(f, "dispatching_tools"),
        }
    }
}

/// Drives the completion/dispatch loop for one ask.
pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Wires the loop to a model client and a tool registry.
    pub fn new(
        model: Arc<dyn ModelClient>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let dispatcher =
            ToolDispatcher::new(Arc::clone(&registry), config.dispatcher.clone());
        Self {
            model,
            registry,
            dispatcher,
            config,
        }
    }

    /// Runs the ask loop over the given conversation.
    ///
    /// The conversation is pinned with the system prompt if absent and
    /// trimmed to the token budget before every completion.
    pub async fn ask(&self, mut conversation: Conversation) -> Result<AskOutcome, AskError> {
        let started = Instant::now();
        conversation.ensure_system_prompt(&system_prompt());
        conversation.trim_to_budget(self.config.max_context_tokens)?;

        let tools = self.registry.definitions();
        let mut tool_usage: Vec<ToolInvocationRecord> = Vec::new();
        let mut partial_content = String::new();
        let mut rounds = 0u32;

        loop {
            if self.deadline_elapsed(started) {
                warn!(rounds, "deadline elapsed, returning partial content");
                return Ok(self.cut_short(
                    &conversation,
                    partial_content,
                    tool_usage,
                    rounds,
                    Termination::DeadlineExceeded,
                ));
            }
            if rounds >= self.config.max_rounds {
                warn!(rounds, "round cap reached, returning partial content");
                return Ok(self.cut_short(
                    &conversation,
                    partial_content,
                    tool_usage,
                    rounds,
                    Termination::MaxRoundsExceeded,
                ));
            }

            rounds += 1;
            debug!(round = rounds, state = %LoopState::AwaitingModel, "requesting completion");
            let completion = self.model.complete(&conversation, &tools).await?;

            match completion {
                Completion::Final { content } => {
                    info!(rounds, tool_calls = tool_usage.len(), "ask completed");
                    return Ok(AskOutcome {
                        content,
                        tool_usage,
                        rounds,
                        termination: Termination::Completed,
                    });
                }
                Completion::ToolCalls { content, calls } => {
                    debug!(
                        round = rounds,
                        state = %LoopState::DispatchingTools,
                        calls = calls.len(),
                        "model requested tool calls"
                    );
                    let request_text = content.unwrap_or_default();
                    if !request_text.is_empty() {
                        partial_content = request_text.clone();
                    }
                    conversation.append(Message::assistant_tool_calls(
                        request_text,
                        calls.clone(),
                    ))?;

                    let outcome = self.dispatcher.dispatch(&calls).await;
                    for message in outcome.messages {
                        conversation.append(message)?;
                    }
                    tool_usage.extend(outcome.records);
                    conversation.trim_to_budget(self.config.max_context_tokens)?;
                }
            }
        }
    }

    fn deadline_elapsed(&self, started: Instant) -> bool {
        self.config
            .request_deadline
            .map(|deadline| started.elapsed() >= deadline)
            .unwrap_or(false)
    }

    /// Builds the outcome for a loop cut short by a guard. Prefers the
    /// partial text stashed from tool-call rounds, then any assistant text
    /// left in the conversation.
    fn cut_short(
        &self,
        conversation: &Conversation,
        partial_content: String,
        tool_usage: Vec<ToolInvocationRecord>,
        rounds: u32,
        termination: Termination,
    ) -> AskOutcome {
        let content = if partial_content.is_empty() {
            conversation
                .last_assistant_content()
                .unwrap_or_default()
                .to_string()
        } else {
            partial_content
        };
        AskOutcome {
            content,
            tool_usage,
            rounds,
            termination,
        }
    }
}

/// System prompt pinned to every conversation, carrying the current date
/// so the model resolves relative ranges like "last month" correctly.
pub fn system_prompt() -> String {
    format!(
        "You are an AI assistant integrated with the ERP system. \
         You answer questions using the provided tools and the data they return. \
         The current date is {}.",
        Utc::now().format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_carries_current_date() {
        let prompt = system_prompt();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(prompt.contains(&today));
    }

    #[test]
    fn termination_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Termination::MaxRoundsExceeded).unwrap(),
            json!("max_rounds_exceeded")
        );
        assert_eq!(
            serde_json::to_value(Termination::Completed).unwrap(),
            json!("completed")
        );
    }

    #[test]
    fn default_config_matches_provider_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.max_context_tokens, 8000);
        assert!(config.request_deadline.is_none());
    }
}
