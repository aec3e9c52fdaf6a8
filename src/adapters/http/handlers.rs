//! HTTP handler for the ask endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use crate::application::{AskError, Orchestrator};
use crate::domain::conversation::{Conversation, ConversationError};
use crate::ports::ModelError;

use super::dto::{AskRequest, AskResponse, ErrorResponse};

/// Application state for the ask endpoint.
#[derive(Clone)]
pub struct AskAppState {
    /// Orchestration loop (wired at startup)
    pub orchestrator: Arc<Orchestrator>,
}

/// Run one ask over a caller-supplied conversation.
///
/// POST /ask
pub async fn ask(
    State(state): State<AskAppState>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let mut messages = Vec::with_capacity(request.conversation.len());
    for dto in &request.conversation {
        match dto.to_message() {
            Ok(message) => messages.push(message),
            Err(reason) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("INVALID_ROLE", reason)),
                )
                    .into_response();
            }
        }
    }

    let conversation = match Conversation::from_messages(messages) {
        Ok(conversation) => conversation,
        Err(err) => return conversation_error_response(err),
    };

    match state.orchestrator.ask(conversation).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AskResponse {
                content: outcome.content,
                tool_usage: outcome.tool_usage,
                rounds: outcome.rounds,
                termination: outcome.termination,
            }),
        )
            .into_response(),
        Err(AskError::Conversation(err)) => conversation_error_response(err),
        Err(AskError::Model(err)) => model_error_response(err),
    }
}

fn conversation_error_response(err: ConversationError) -> axum::response::Response {
    let (status, code) = match &err {
        ConversationError::DanglingToolResult { .. } => {
            (StatusCode::BAD_REQUEST, "DANGLING_TOOL_RESULT")
        }
        ConversationError::ContextTooLarge { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, "CONTEXT_TOO_LARGE")
        }
    };
    (status, Json(ErrorResponse::new(code, err.to_string()))).into_response()
}

fn model_error_response(err: ModelError) -> axum::response::Response {
    error!(%err, "model client failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse::new("MODEL_ERROR", err.to_string())),
    )
        .into_response()
}
