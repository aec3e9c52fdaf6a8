//! Tool Dispatcher - validates and executes the tool calls of one round.
//!
//! Every requested call produces exactly one tool message and one audit
//! record, success or failure; nothing a handler does (bad arguments,
//! errors, panics, hangs) escapes dispatch. Failures re-enter the
//! conversation as tool-message content so the model can self-correct on
//! the next round.
//!
//! Execution order: maximal runs of consecutive read-only calls run
//! concurrently under a bounded worker pool; a mutating call always runs
//! alone. Whatever the completion order, results are reassembled into the
//! exact order the calls were requested, because providers require strict
//! call/result pairing on the next round.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::conversation::{Message, ToolCallRequest};
use crate::domain::tools::{validate_parameters, ToolInvocationRecord};

use super::registry::ToolRegistry;

/// Length cap for audit result summaries.
const SUMMARY_MAX_CHARS: usize = 160;

/// Dispatcher tuning knobs.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Per-call execution timeout.
    pub call_timeout: Duration,
    /// Worker-pool bound for concurrent read-only calls.
    pub max_parallel_calls: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            max_parallel_calls: 4,
        }
    }
}

/// Result of dispatching one round of tool calls.
///
/// Both vectors are in request order and have one entry per call.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Tool messages to append to the conversation.
    pub messages: Vec<Message>,
    /// Audit records for the round.
    pub records: Vec<ToolInvocationRecord>,
}

/// One completed call, before reassembly.
struct CallCompletion {
    message: Message,
    record: ToolInvocationRecord,
}

/// Executes the tool calls requested in one assistant turn.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    config: DispatcherConfig,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: Arc<ToolRegistry>, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    /// Executes all calls of a round and reassembles results in request order.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> DispatchOutcome {
        debug!(count = calls.len(), "dispatching tool calls");

        let mut slots: Vec<Option<CallCompletion>> =
            (0..calls.len()).map(|_| None).collect();
        let mut index = 0;

        while index < calls.len() {
            if self.is_read_only(&calls[index]) {
                let mut end = index;
                while end < calls.len() && self.is_read_only(&calls[end]) {
                    end += 1;
                }

                let semaphore =
                    Arc::new(Semaphore::new(self.config.max_parallel_calls.max(1)));
                let batch = calls[index..end].iter().cloned().enumerate().map(
                    |(offset, call)| {
                        let registry = Arc::clone(&self.registry);
                        let semaphore = Arc::clone(&semaphore);
                        let timeout = self.config.call_timeout;
                        async move {
                            // never closed while dispatch holds it
                            let _permit = semaphore.acquire_owned().await.ok();
                            (offset, run_call(registry, timeout, call).await)
                        }
                    },
                );
                for (offset, completion) in join_all(batch).await {
                    slots[index + offset] = Some(completion);
                }
                index = end;
            } else {
                let completion = run_call(
                    Arc::clone(&self.registry),
                    self.config.call_timeout,
                    calls[index].clone(),
                )
                .await;
                slots[index] = Some(completion);
                index += 1;
            }
        }

        let mut messages = Vec::with_capacity(calls.len());
        let mut records = Vec::with_capacity(calls.len());
        for completion in slots.into_iter().flatten() {
            messages.push(completion.message);
            records.push(completion.record);
        }
        DispatchOutcome { messages, records }
    }

    /// A call is safe to parallelize when its tool declares read-only.
    /// Unknown names execute nothing and count as read-only.
    fn is_read_only(&self, call: &ToolCallRequest) -> bool {
        self.registry
            .lookup(call.name())
            .map(|tool| tool.definition().is_read_only())
            .unwrap_or(true)
    }
}

/// Runs one call through parse, validate, resolve, and timed invocation.
async fn run_call(
    registry: Arc<ToolRegistry>,
    call_timeout: Duration,
    call: ToolCallRequest,
) -> CallCompletion {
    let invoked_at = Utc::now();
    let started = Instant::now();

    let raw = call.arguments().trim();
    let parameters: Value = if raw.is_empty() {
        json!({})
    } else {
        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                return fail(
                    &call,
                    json!({}),
                    format!("ArgumentParseError: {err}"),
                    invoked_at,
                    started,
                );
            }
        }
    };

    let Some(tool) = registry.lookup(call.name()) else {
        return fail(
            &call,
            parameters,
            format!("UnknownTool: {}", call.name()),
            invoked_at,
            started,
        );
    };

    if let Err(err) = validate_parameters(tool.definition().parameters_schema(), &parameters)
    {
        return fail(
            &call,
            parameters,
            format!("ValidationError: {err}"),
            invoked_at,
            started,
        );
    }

    // spawned so a panicking handler cannot tear down the round
    let handler = tool.handler();
    let handler_parameters = parameters.clone();
    let mut task = tokio::spawn(async move { handler.invoke(handler_parameters).await });

    match tokio::time::timeout(call_timeout, &mut task).await {
        Err(_elapsed) => {
            task.abort();
            fail(
                &call,
                parameters,
                format!(
                    "ToolExecutionError: timed out after {}s",
                    call_timeout.as_secs()
                ),
                invoked_at,
                started,
            )
        }
        Ok(Err(join_err)) => fail(
            &call,
            parameters,
            format!("ToolExecutionError: handler panicked: {join_err}"),
            invoked_at,
            started,
        ),
        Ok(Ok(Err(tool_err))) => fail(
            &call,
            parameters,
            format!("ToolExecutionError: {tool_err}"),
            invoked_at,
            started,
        ),
        Ok(Ok(Ok(value))) => {
            let canonical = value.to_canonical_string();
            let record = ToolInvocationRecord::success(
                call.name(),
                parameters,
                summarize(&canonical),
                invoked_at,
                started.elapsed().as_millis() as u32,
            );
            CallCompletion {
                message: Message::tool(call.id(), canonical),
                record,
            }
        }
    }
}

/// Builds the error-path completion: one tool message and one failed record.
fn fail(
    call: &ToolCallRequest,
    parameters: Value,
    error: String,
    invoked_at: chrono::DateTime<Utc>,
    started: Instant,
) -> CallCompletion {
    warn!(tool = call.name(), %error, "tool call recorded as error");
    let record = ToolInvocationRecord::failure(
        call.name(),
        parameters,
        error.clone(),
        invoked_at,
        started.elapsed().as_millis() as u32,
    );
    CallCompletion {
        message: Message::tool(call.id(), error),
        record,
    }
}

/// Trims long canonical payloads down to an audit-friendly summary.
fn summarize(text: &str) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{truncated}...")
}
