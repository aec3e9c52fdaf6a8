//! ERP Copilot - Conversational assistant core for ERP data.
//!
//! This crate implements the tool-calling orchestration engine that sits
//! between a chat-completion provider and a registry of data-retrieval
//! tools: the model decides when to invoke a tool, the engine executes it,
//! and results are fed back until a final answer is produced.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
