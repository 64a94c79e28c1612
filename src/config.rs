//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    /// API credential for the generative-language backend.
    pub api_key: SecretString,
    /// Model identifier.
    pub model: String,
    /// Base URL of the generative-language endpoint (overridable for tests).
    pub base_url: String,
    /// Port for the HTTP surface.
    pub port: u16,
    /// Default language the oracle answers in for new sessions.
    pub default_language: String,
}

impl ScreeningConfig {
    /// Load configuration from the environment.
    ///
    /// `GOOGLE_API_KEY` is required: its absence is a fatal startup
    /// condition reported to the operator, never a per-call error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| ConfigError::MissingRequired {
            key: "GOOGLE_API_KEY".to_string(),
            hint: "export GOOGLE_API_KEY=<your Gemini API key>".to_string(),
        })?;

        let model = std::env::var("TALENTSCOUT_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let base_url = std::env::var("TALENTSCOUT_GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());

        let port = match std::env::var("TALENTSCOUT_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TALENTSCOUT_PORT".to_string(),
                message: format!("not a valid port number: {raw}"),
            })?,
            Err(_) => 8080,
        };

        let default_language =
            std::env::var("TALENTSCOUT_LANGUAGE").unwrap_or_else(|_| "English".to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            base_url,
            port,
            default_language,
        })
    }
}
