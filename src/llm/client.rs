//! Core `LlmClient` trait and `GeminiClient` implementation.
//!
//! `GeminiClient` calls the Gemini REST `generateContent` endpoint directly
//! over `reqwest`.  Generation parameters come from [`GeminiConfig`]; the
//! base URL and timeout come from the tool settings so tests and proxies can
//! point it elsewhere.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{GeminiConfig, LlmConfig, ServiceConfig};

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The model returned no usable text.
    #[error("No content generated by the model.")]
    EmptyResponse,

    /// No key in config, `GEMINI_API_KEY` or `GOOGLE_API_KEY`.
    #[error("Gemini API key not found: set api_key in the config, GEMINI_API_KEY or GOOGLE_API_KEY")]
    MissingApiKey,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// LlmClient trait
// ---------------------------------------------------------------------------

/// Async trait for LLM text generation.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn LlmClient>`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the given system and user prompts.
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls `{base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Build a client, resolving the API key from config or environment.
    pub fn from_config(llm: &LlmConfig, services: &ServiceConfig) -> Result<Self, LlmError> {
        let api_key = llm.resolve_api_key().ok_or(LlmError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(services.llm_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            base_url: services.gemini_base_url.trim_end_matches('/').to_string(),
            api_key,
            config: llm.gemini.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.config.model
        )
    }
}

/// Request body for `generateContent`.
pub(crate) fn request_body(config: &GeminiConfig, system: &str, user: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [ { "text": system } ] },
        "contents": [
            { "role": "user", "parts": [ { "text": user } ] }
        ],
        "generationConfig": {
            "temperature":     config.temperature,
            "maxOutputTokens": config.max_output_tokens,
            "thinkingConfig": {
                "includeThoughts": config.thinking_config.include_thoughts,
                "thinkingBudget":  config.thinking_config.thinking_budget
            }
        }
    })
}

/// Concatenate the text parts of the first candidate, skipping thoughts.
pub(crate) fn extract_text(response: &Value) -> Result<String, LlmError> {
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = parts
        .iter()
        .filter(|p| !p["thought"].as_bool().unwrap_or(false))
        .filter_map(|p| p["text"].as_str())
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = request_body(&self.config, system, user);
        log::debug!("gemini: POST {} (model={})", self.url(), self.config.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        extract_text(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_generation_config() {
        let mut cfg = GeminiConfig::default();
        cfg.thinking_config.thinking_budget = 512;
        let body = request_body(&cfg, "sys", "usr");

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "usr");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            512
        );
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["includeThoughts"],
            false
        );
    }

    #[test]
    fn extract_skips_thought_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning...", "thought": true },
                    { "text": "ALICE: Hi\n" },
                    { "text": "BOB: Hello\n" }
                ]}
            }]
        });
        assert_eq!(extract_text(&response).unwrap(), "ALICE: Hi\nBOB: Hello");
    }

    #[test]
    fn extract_empty_is_error() {
        let blank = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert!(matches!(extract_text(&blank), Err(LlmError::EmptyResponse)));

        let missing = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(extract_text(&missing), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn from_config_requires_key() {
        let mut llm = LlmConfig::default();
        llm.api_key = "test-key".into();
        let client = GeminiClient::from_config(&llm, &ServiceConfig::default()).unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    /// Verify that `GeminiClient` is usable as `dyn LlmClient`.
    #[test]
    fn client_is_object_safe() {
        let mut llm = LlmConfig::default();
        llm.api_key = "k".into();
        let client: Box<dyn LlmClient> =
            Box::new(GeminiClient::from_config(&llm, &ServiceConfig::default()).unwrap());
        drop(client);
    }
}
