//! HTTP adapter: the ask endpoint.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{AskRequest, AskResponse, ErrorResponse, MessageDto};
pub use handlers::AskAppState;
pub use routes::ask_routes;
