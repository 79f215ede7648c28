use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace};

use crate::backend::{
    CompletionProvider, CompletionRequest, check_response_status, decode_json, handle_http_error,
};
use crate::error::{CineBotError, ProviderError, Result};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Defaults to [`GEMINI_BASE_URL`]
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

/// Gemini client for generating completions
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

// Gemini API request and response structures
#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with its text parts joined in order.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        trace!(finish_reason = ?candidate.finish_reason, "Completion finish reason");
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiClient {
    /// Create a new Gemini client with the provided API key.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use cinebot::GeminiClient;
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = GeminiClient::new("your-gemini-api-key")?.model("gemini-2.5-flash");
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "gemini_client_new", skip(api_key))]
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CineBotError::Configuration(
                "Gemini API key cannot be empty".to_string(),
            ));
        }

        let config = GeminiConfig {
            api_key,
            model: GEMINI_DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            temperature: 0.8,
            max_tokens: Some(1000),
            timeout: None,
        };

        info!(model = %config.model, "Created Gemini client");

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

// Generate builder methods using macro
crate::impl_client_builder_methods! {
    client_type: GeminiClient,
    provider_name: "Gemini"
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    #[instrument(
        name = "gemini_complete",
        skip(self, request),
        fields(model = %self.config.model, prompt_len = request.prompt.len())
    )]
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, ProviderError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        debug!(url = %url, "Sending request to Gemini API");
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| handle_http_error(e, "Gemini"))?;

        let response = check_response_status(response, "Gemini").await?;
        let completion: GenerateContentResponse = decode_json(response, "Gemini").await?;

        match completion.into_text() {
            Some(text) => {
                debug!(content_len = text.len(), "Extracted text content from response");
                Ok(text)
            }
            None => {
                error!("No text content in Gemini response");
                Err(ProviderError::NoChoices)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Option<String> {
        serde_json::from_value::<GenerateContentResponse>(value)
            .unwrap()
            .into_text()
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let text = parse(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"recommendations\":"}, {"text": "[]}"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }));
        assert_eq!(text.as_deref(), Some("{\"recommendations\":[]}"));
    }

    #[test]
    fn test_empty_envelopes_have_no_text() {
        assert_eq!(parse(json!({})), None);
        assert_eq!(parse(json!({"candidates": []})), None);
        assert_eq!(parse(json!({"candidates": [{"finishReason": "SAFETY"}]})), None);
        assert_eq!(parse(json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]})), None);
    }

    #[test]
    fn test_request_uses_camel_case() {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.8,
                max_output_tokens: Some(500),
                response_mime_type: "application/json",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 500);
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }
}
