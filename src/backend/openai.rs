use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace};

use crate::backend::{
    CompletionProvider, CompletionRequest, check_response_status, decode_json, handle_http_error,
};
use crate::error::{CineBotError, ProviderError, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
}

/// Client for OpenAI-style `/chat/completions` endpoints.
///
/// DeepSeek speaks the same protocol, so [`OpenAIClient::deepseek`] is the
/// same client pointed at a different base URL and model.
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: reqwest::Client,
    provider_name: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

impl OpenAIClient {
    /// Create a client for the OpenAI API with default configuration
    #[instrument(name = "openai_client_new", skip(api_key))]
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_defaults(api_key.into(), OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL, "OpenAI")
    }

    /// Create a client for the DeepSeek API (`deepseek-chat`)
    #[instrument(name = "deepseek_client_new", skip(api_key))]
    pub fn deepseek(api_key: impl Into<String>) -> Result<Self> {
        Self::with_defaults(
            api_key.into(),
            DEEPSEEK_BASE_URL,
            DEEPSEEK_DEFAULT_MODEL,
            "DeepSeek",
        )
    }

    fn with_defaults(
        api_key: String,
        base_url: &str,
        model: &str,
        provider_name: &'static str,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CineBotError::Configuration(format!(
                "{provider_name} API key cannot be empty"
            )));
        }

        let config = OpenAIConfig {
            api_key,
            model: model.to_string(),
            base_url: base_url.to_string(),
            temperature: 0.8,
            max_tokens: Some(1000),
            timeout: None,
        };

        info!(
            provider = provider_name,
            model = %config.model,
            "Created OpenAI-compatible client"
        );

        Ok(Self {
            config,
            client: reqwest::Client::new(),
            provider_name,
        })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

// Generate builder methods using macro
crate::impl_client_builder_methods! {
    client_type: OpenAIClient,
    provider_name: "OpenAI"
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    #[instrument(
        name = "openai_complete",
        skip(self, request),
        fields(
            provider = self.provider_name,
            model = %self.config.model,
            prompt_len = request.prompt.len()
        )
    )]
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(url = %url, "Sending request to {} API", self.provider_name);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| handle_http_error(e, self.provider_name))?;

        let response = check_response_status(response, self.provider_name).await?;
        let completion: ChatCompletionResponse = decode_json(response, self.provider_name).await?;

        let Some(choice) = completion.choices.into_iter().next() else {
            error!("{} returned empty choices array", self.provider_name);
            return Err(ProviderError::NoChoices);
        };
        trace!(finish_reason = ?choice.finish_reason, "Completion finish reason");

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => {
                debug!(content_len = content.len(), "Extracted content from response");
                Ok(content)
            }
            _ => {
                error!("No content in {} response", self.provider_name);
                Err(ProviderError::NoChoices)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.provider_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_configuration_error() {
        let err = OpenAIClient::deepseek("  ").err().unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_deepseek_defaults() {
        let client = OpenAIClient::deepseek("sk-test").unwrap();
        assert_eq!(client.name(), "DeepSeek");
        assert_eq!(client.config().base_url, DEEPSEEK_BASE_URL);
        assert_eq!(client.config().model, DEEPSEEK_DEFAULT_MODEL);
        assert_eq!(client.config().temperature, 0.8);
    }

    #[test]
    fn test_builder_overrides() {
        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .model("gpt-4o")
            .temperature(0.7)
            .max_tokens(0)
            .base_url("http://localhost:8080/v1/");
        assert_eq!(client.config().model, "gpt-4o");
        assert_eq!(client.config().temperature, 0.7);
        assert_eq!(client.config().max_tokens, Some(1));
        assert_eq!(client.config().base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: "deepseek-chat",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.8,
            max_tokens: None,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["stream"], false);
        assert!(json.get("max_tokens").is_none());
    }
}
