//! Native Gemini `generateContent` REST provider.
//!
//! Speaks the generative-language HTTP API directly: system messages map
//! to `systemInstruction`, assistant turns to the `model` role, and
//! structured-output requests to `responseSchema`/`responseMimeType` in
//! the generation config. Strictly one attempt per call — the screening
//! flow degrades failures at the oracle boundary instead of retrying.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

const PROVIDER_NAME: &str = "gemini";

/// Outbound request timeout, so a hung backend cannot stall a session
/// indefinitely.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Native Gemini provider.
pub struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new provider against the given endpoint.
    pub fn new(api_key: SecretString, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = build_request(&request);

        tracing::debug!(model = %self.model, "Sending request to Gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let response_text = response.text().await.unwrap_or_default();

        tracing::debug!(%status, "Gemini response status");
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("Gemini response body: {}", response_text);
        }

        if !status.is_success() {
            let code = status.as_u16();
            if code == 401 || code == 403 {
                return Err(LlmError::AuthFailed {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            if code == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("HTTP {}: {}", status, response_text),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("JSON parse error: {}. Raw: {}", e, response_text),
            })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "no candidates in response".to_string(),
            })?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = parsed.usage_metadata.unwrap_or_default();

        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            finish_reason: parse_finish_reason(candidate.finish_reason.as_deref()),
        })
    }
}

// -- generateContent request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    role: String,
    parts: Vec<ApiPartOut>,
}

#[derive(Debug, Serialize)]
struct ApiSystemInstruction {
    parts: Vec<ApiPartOut>,
}

#[derive(Debug, Serialize)]
struct ApiPartOut {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    usage_metadata: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiPartIn>,
}

#[derive(Debug, Deserialize)]
struct ApiPartIn {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// -- Message conversion --

/// Convert our request to generateContent format.
///
/// Gemini requires:
/// - System messages extracted to the top-level `systemInstruction`
/// - Assistant turns under the `model` role
/// - Structured output declared in the generation config
fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
    let mut system_text: Option<String> = None;
    let mut contents: Vec<ApiContent> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System => {
                if let Some(ref mut existing) = system_text {
                    existing.push_str("\n\n");
                    existing.push_str(&msg.content);
                } else {
                    system_text = Some(msg.content.clone());
                }
            }
            Role::User => contents.push(api_content("user", &msg.content)),
            Role::Assistant => contents.push(api_content("model", &msg.content)),
        }
    }

    let generation_config = if request.temperature.is_some()
        || request.max_tokens.is_some()
        || request.response_schema.is_some()
    {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents,
        system_instruction: system_text.map(|text| ApiSystemInstruction {
            parts: vec![ApiPartOut { text }],
        }),
        generation_config,
    }
}

fn api_content(role: &str, text: &str) -> ApiContent {
    ApiContent {
        role: role.to_string(),
        parts: vec![ApiPartOut {
            text: text.to_string(),
        }],
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("PROHIBITED_CONTENT") => FinishReason::ContentFilter,
        _ => FinishReason::Unknown,
    }
}
