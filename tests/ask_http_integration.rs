//! Integration tests for the ask HTTP endpoint.
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot`:
//! 1. Happy path returns the answer plus the tool audit trail
//! 2. Invalid inbound roles are rejected with 400
//! 3. Provider failures surface as 502

use std::sync::Arc;

use axum::body::Body;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use erp_copilot::adapters::ai::ScriptedModelClient;
use erp_copilot::adapters::http::{ask_routes, AskAppState};
use erp_copilot::adapters::tools::CurrentDateTool;
use erp_copilot::application::{Orchestrator, OrchestratorConfig, ToolRegistry};
use erp_copilot::ports::{ModelClient, ModelError};

fn app(client: ScriptedModelClient) -> axum::Router {
    let model: Arc<dyn ModelClient> = Arc::new(client);
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(CurrentDateTool::definition(), Arc::new(CurrentDateTool))
            .unwrap()
            .build(),
    );
    let orchestrator = Arc::new(Orchestrator::new(
        model,
        registry,
        OrchestratorConfig::default(),
    ));

    axum::Router::new()
        .nest("/api", ask_routes())
        .with_state(AskAppState { orchestrator })
}

async fn post_ask(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn ask_returns_answer_and_tool_usage() {
    let client = ScriptedModelClient::new()
        .with_tool_call("call_1", "current_date", "{}")
        .with_final("Today is a fine day to reconcile ledgers.");

    let (status, body) = post_ask(
        app(client),
        json!({
            "conversation": [
                { "role": "user", "content": "What day is it?" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["content"],
        "Today is a fine day to reconcile ledgers."
    );
    assert_eq!(body["termination"], "completed");
    assert_eq!(body["rounds"], 2);

    let usage = body["tool_usage"].as_array().unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0]["tool_name"], "current_date");
    assert_eq!(usage[0]["status"], "success");
}

#[tokio::test]
async fn prior_assistant_turns_are_accepted() {
    let client = ScriptedModelClient::new().with_final("As I said, two customers.");

    let (status, body) = post_ask(
        app(client),
        json!({
            "conversation": [
                { "role": "user", "content": "Who are my customers?" },
                { "role": "assistant", "content": "You have two customers." },
                { "role": "user", "content": "Repeat that?" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "As I said, two customers.");
}

#[tokio::test]
async fn invalid_role_is_rejected() {
    let client = ScriptedModelClient::new();

    let (status, body) = post_ask(
        app(client),
        json!({
            "conversation": [
                { "role": "moderator", "content": "hi" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ROLE");
    assert!(body["message"].as_str().unwrap().contains("moderator"));
}

#[tokio::test]
async fn tool_role_is_rejected_inbound() {
    let client = ScriptedModelClient::new();

    let (status, body) = post_ask(
        app(client),
        json!({
            "conversation": [
                { "role": "tool", "content": "[]" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ROLE");
}

#[tokio::test]
async fn provider_failure_surfaces_as_bad_gateway() {
    let client = ScriptedModelClient::new().with_error(ModelError::AuthenticationFailed);

    let (status, body) = post_ask(
        app(client),
        json!({
            "conversation": [
                { "role": "user", "content": "hi" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MODEL_ERROR");
}
