//! LLM integration for TalentScout.
//!
//! The screening flow talks to a text-completion backend through the
//! `LlmProvider` trait; production uses the native Gemini provider. The
//! `PromptOracle` sits on top and turns every failure into a degraded
//! textual reply so the flow never has to handle transport errors.

mod gemini;
pub mod oracle;
pub mod provider;

pub use gemini::GeminiProvider;
pub use oracle::{OracleOptions, PromptOracle, StructuredReply};
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role};

use std::sync::Arc;

use crate::config::ScreeningConfig;
use crate::error::LlmError;

/// Create the production LLM provider from configuration.
pub fn create_provider(config: &ScreeningConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = GeminiProvider::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.model.clone(),
    );
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(provider))
}
