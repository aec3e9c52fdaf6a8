//! Axum router configuration for the ask endpoint.

use axum::{routing::post, Router};

use super::handlers::{ask, AskAppState};

/// Create the ask API router.
///
/// # Routes
///
/// - `POST /ask` - Run one ask over a caller-supplied conversation
///
/// Suitable for mounting at `/api`.
pub fn ask_routes() -> Router<AskAppState> {
    Router::new().route("/ask", post(ask))
}
