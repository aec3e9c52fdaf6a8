//! erp-copilot server entry point.
//!
//! Wires the orchestration loop to the OpenAI client and the built-in
//! tool registry, then serves the ask endpoint over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use erp_copilot::adapters::ai::{OpenAiClient, OpenAiConfig};
use erp_copilot::adapters::http::{ask_routes, AskAppState};
use erp_copilot::adapters::tools::CurrentDateTool;
use erp_copilot::application::{
    DispatcherConfig, Orchestrator, OrchestratorConfig, ToolRegistry,
};
use erp_copilot::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;

    let api_key = config.ai.openai_api_key.clone().unwrap_or_default();
    let model = Arc::new(OpenAiClient::new(
        OpenAiConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    ));

    let registry = Arc::new(
        ToolRegistry::builder()
            .register(CurrentDateTool::definition(), Arc::new(CurrentDateTool))?
            .build(),
    );
    info!(tools = registry.tool_count(), model = %config.ai.model, "registry ready");

    let orchestrator = Arc::new(Orchestrator::new(
        model,
        registry,
        OrchestratorConfig {
            max_rounds: config.ai.max_rounds,
            max_context_tokens: config.ai.max_context_tokens,
            request_deadline: Some(Duration::from_secs(config.server.request_timeout_secs)),
            dispatcher: DispatcherConfig {
                call_timeout: config.ai.call_timeout(),
                max_parallel_calls: config.ai.max_parallel_calls,
            },
        },
    ));

    let app = axum::Router::new()
        .nest("/api", ask_routes())
        .with_state(AskAppState { orchestrator })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
