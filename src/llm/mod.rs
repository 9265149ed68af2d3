//! LLM integration for the agent.
//!
//! The model is treated as an opaque collaborator behind [`LlmProvider`]:
//! messages plus tool definitions in, one assistant message out.

mod google;
mod provider;

pub use google::GoogleGeminiProvider;
pub use provider::{
    ChatMessage, LlmProvider, Role, ToolCall, ToolCompletionRequest, ToolCompletionResponse,
    ToolDefinition,
};

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Create the configured LLM provider.
pub fn create_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    tracing::info!(model = %config.model, "Using Google Gemini chat completions API");
    Ok(Arc::new(GoogleGeminiProvider::new(config.clone())?))
}
