//! LLM Client module for LegalEase
//!
//! Provider clients behind the `LlmClient` trait, the deterministic offline
//! stand-in, and the `Gateway` the pipeline stages call through.

use std::sync::Arc;

use tracing::{debug, info};

mod anthropic;
pub mod client;
mod error;
mod gateway;
mod http;
mod offline;
mod openai;
mod scripted;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use gateway::Gateway;
pub use offline::{OFFLINE_REVIEW, OfflineClient, classify_text, draft_sections};
pub use openai::OpenAIClient;
pub use scripted::ScriptedClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// The offline stand-in is used when it is requested explicitly or when the
/// provider's API key is not set.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    if config.wants_offline() {
        info!("Using offline LLM stand-in");
        return Ok(Arc::new(OfflineClient::new()));
    }

    if let Err(e) = config.get_api_key() {
        info!(env = %config.api_key_env, "{}; using offline LLM stand-in", e);
        return Ok(Arc::new(OfflineClient::new()));
    }

    match config.provider.as_str() {
        "openai" | "groq" => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Unavailable(format!(
                "Unknown LLM provider: '{}'. Supported: openai, groq, anthropic, offline",
                other
            )))
        }
    }
}
