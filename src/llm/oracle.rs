//! `PromptOracle` — the degrading boundary in front of the LLM provider.
//!
//! Every call is at-most-one-attempt and never returns an error: transport
//! and backend failures collapse into a user-facing apology string, and a
//! structured reply that fails to parse falls back to the raw text.

use std::sync::Arc;

use serde_json::Value;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider, Role};

/// Apology returned when the backend produced no usable reply.
pub const NO_REPLY_APOLOGY: &str =
    "I apologize, I couldn't generate a response. Please try again.";

/// Apology returned when the transport or backend failed outright.
pub const FAILURE_APOLOGY: &str = "An error occurred while processing. Please try again.";

/// Options applied to every oracle call.
#[derive(Debug, Clone)]
pub struct OracleOptions {
    /// Language the oracle is directed to answer in.
    pub language: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl OracleOptions {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Outcome of a structured-output request.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredReply {
    /// The reply parsed as JSON.
    Parsed(Value),
    /// Parse failed; the raw text is returned instead (non-fatal).
    Raw(String),
}

/// Thin wrapper over a text-completion provider.
pub struct PromptOracle {
    provider: Arc<dyn LlmProvider>,
}

impl PromptOracle {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Complete a single instruction.
    pub async fn instruct(&self, instruction: &str, opts: &OracleOptions) -> String {
        let directive = language_directive(&opts.language);
        let messages = vec![ChatMessage::user(format!("{directive}{instruction}"))];
        self.run(messages, opts, None).await
    }

    /// Complete a conversation history.
    ///
    /// The language directive is folded into the last user turn; if the
    /// history does not end with one, a user turn carrying only the
    /// directive is appended.
    pub async fn converse(&self, history: &[ChatMessage], opts: &OracleOptions) -> String {
        let messages = with_language_directive(history, &opts.language);
        self.run(messages, opts, None).await
    }

    /// Complete a single instruction, requesting output matching `schema`.
    pub async fn instruct_structured(
        &self,
        instruction: &str,
        schema: Value,
        opts: &OracleOptions,
    ) -> StructuredReply {
        let directive = language_directive(&opts.language);
        let messages = vec![ChatMessage::user(format!("{directive}{instruction}"))];
        let text = self.run(messages, opts, Some(schema)).await;

        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => StructuredReply::Parsed(value),
            Err(e) => {
                tracing::warn!("Expected JSON from oracle, got non-JSON ({e}): {text}");
                StructuredReply::Raw(text)
            }
        }
    }

    async fn run(
        &self,
        messages: Vec<ChatMessage>,
        opts: &OracleOptions,
        schema: Option<Value>,
    ) -> String {
        let mut request = CompletionRequest::new(messages);
        request.temperature = opts.temperature;
        request.max_tokens = opts.max_tokens;
        request.response_schema = schema;

        match self.provider.complete(request).await {
            Ok(response) => response.content,
            Err(LlmError::InvalidResponse { provider, reason }) => {
                tracing::warn!(%provider, %reason, "Oracle returned no usable reply");
                NO_REPLY_APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!("Oracle call failed: {e}");
                FAILURE_APOLOGY.to_string()
            }
        }
    }
}

fn language_directive(language: &str) -> String {
    format!("Respond concisely and professionally, in {language}. ")
}

fn with_language_directive(history: &[ChatMessage], language: &str) -> Vec<ChatMessage> {
    let directive = language_directive(language);
    let mut messages: Vec<ChatMessage> = history.to_vec();

    match messages.last_mut() {
        Some(last) if last.role == Role::User => {
            last.content = format!("{directive}{}", last.content);
        }
        _ => messages.push(ChatMessage::user(directive)),
    }
    messages
}
