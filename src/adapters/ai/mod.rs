//! AI adapters: the OpenAI client and the scripted test double.

pub mod openai_client;
pub mod scripted_client;

pub use openai_client::{OpenAiClient, OpenAiConfig};
pub use scripted_client::{RecordedRequest, ScriptedModelClient};
