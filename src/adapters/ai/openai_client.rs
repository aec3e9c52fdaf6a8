//! OpenAI Client - chat-completion provider with function calling.
//!
//! Implements the model boundary against OpenAI's chat completions API
//! with `tools` and `tool_choice: "auto"`. Transient failures (429, 5xx,
//! network, timeout) are retried here with exponential backoff; the
//! orchestration loop never sees a retry.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiConfig::new(api_key)
//!     .with_model("gpt-3.5-turbo")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let client = OpenAiClient::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::conversation::{Conversation, Message, MessageRole, ToolCallRequest};
use crate::domain::tools::ToolDefinition;
use crate::ports::{Completion, ModelClient, ModelError};

/// Configuration for the OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-3.5-turbo", "gpt-4-turbo").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts the conversation and tool definitions to the wire format.
    fn to_chat_request(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> ChatRequest {
        let messages = conversation.messages().iter().map(wire_message).collect();
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(tools.iter().map(ToolDefinition::to_openai_format).collect()),
                Some("auto"),
            )
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            tools,
            tool_choice,
        }
    }

    /// Sends the request, mapping transport failures.
    async fn send_request(&self, request: &ChatRequest) -> Result<Response, ModelError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ModelError::network(format!("Connection failed: {}", e))
                } else {
                    ModelError::network(e.to_string())
                }
            })
    }

    /// Maps the API response status, draining the body on errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, ModelError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ModelError::AuthenticationFailed),
            429 => Err(ModelError::rate_limited(parse_retry_after(&error_body))),
            400 => Err(ModelError::InvalidRequest(error_body)),
            500..=599 => Err(ModelError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(ModelError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses the response body into a completion.
    async fn parse_response(&self, response: Response) -> Result<Completion, ModelError> {
        let response = self.handle_response_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::parse(format!("Failed to parse response: {}", e)))?;

        completion_from_response(chat_response)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Completion, ModelError> {
        let request = self.to_chat_request(conversation, tools);
        let mut last_error = ModelError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&request).await {
                Ok(response) => match self.parse_response(response).await {
                    Ok(completion) => return Ok(completion),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...; rate limits honor the
            // provider-supplied delay instead.
            let delay = match &last_error {
                ModelError::RateLimited { retry_after_secs } => {
                    Duration::from_secs(u64::from(*retry_after_secs))
                }
                _ => Duration::from_secs(1 << retry_count),
            };
            warn!(attempt = retry_count + 1, delay_secs = delay.as_secs(), "retrying completion");
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }
}

/// Parses retry-after from a 429 error body.
///
/// OpenAI sometimes embeds "try again in Xs" in the error message;
/// defaults to 30 seconds when absent.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(msg) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            if let Some(idx) = msg.find("try again in ") {
                let rest = &msg[idx + 13..];
                if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                    if let Ok(secs) = rest[..num_end].parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
    }
    30
}

/// Maps a parsed response body to the port-level completion.
fn completion_from_response(response: ChatResponse) -> Result<Completion, ModelError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::parse("No choices in response"))?;

    let content = choice.message.content;
    let tool_calls = choice.message.tool_calls;

    if tool_calls.is_empty() {
        debug!("completion is a final message");
        return Ok(Completion::Final {
            content: content.unwrap_or_default(),
        });
    }

    let calls = tool_calls
        .into_iter()
        .map(|call| ToolCallRequest::new(call.id, call.function.name, call.function.arguments))
        .collect();
    debug!("completion requests tool calls");
    Ok(Completion::ToolCalls { content, calls })
}

/// Converts a domain message to the wire format.
fn wire_message(message: &Message) -> WireMessage {
    let role = match message.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };
    let tool_calls = message
        .tool_calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id().to_string(),
            call_type: "function".to_string(),
            function: WireFunction {
                name: call.name().to_string(),
                arguments: call.arguments().to_string(),
            },
        })
        .collect();

    WireMessage {
        role: role.to_string(),
        content: Some(message.content.clone()),
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}
