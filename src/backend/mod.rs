pub mod client;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retry;
pub mod utils;

pub use client::{CompletionProvider, CompletionRequest};
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
#[cfg(feature = "openai")]
pub use openai::OpenAIClient;
pub use retry::{RetryError, RetryPolicy};
pub use utils::{
    build_http_client, check_response_status, decode_json, handle_http_error, strip_code_fence,
};

use tracing::info;

use crate::config::{Config, ProviderKind};
use crate::error::{CineBotError, Result};

/// Build the completion provider selected by `LLM_PROVIDER`.
///
/// Fails with `CineBotError::Configuration` when the provider's key is
/// missing or its adapter was compiled out.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn CompletionProvider>> {
    let api_key = config.llm_api_key()?;
    info!(provider = %config.llm_provider, "Selecting completion provider");

    match config.llm_provider {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAI | ProviderKind::DeepSeek => {
            let mut client = if config.llm_provider == ProviderKind::OpenAI {
                OpenAIClient::new(api_key)?
            } else {
                OpenAIClient::deepseek(api_key)?
            };
            client = client
                .temperature(config.llm_temperature)
                .max_tokens(config.llm_max_tokens)
                .timeout(config.llm_timeout());
            if let Some(model) = &config.llm_model {
                client = client.model(model.as_str());
            }
            if let Some(base_url) = &config.llm_base_url {
                client = client.base_url(base_url.as_str());
            }
            let provider: Box<dyn CompletionProvider> = Box::new(client);
            Ok(provider)
        }
        #[cfg(feature = "gemini")]
        ProviderKind::Gemini => {
            let mut client = GeminiClient::new(api_key)?
                .temperature(config.llm_temperature)
                .max_tokens(config.llm_max_tokens)
                .timeout(config.llm_timeout());
            if let Some(model) = &config.llm_model {
                client = client.model(model.as_str());
            }
            if let Some(base_url) = &config.llm_base_url {
                client = client.base_url(base_url.as_str());
            }
            let provider: Box<dyn CompletionProvider> = Box::new(client);
            Ok(provider)
        }
        #[allow(unreachable_patterns)]
        other => Err(CineBotError::Configuration(format!(
            "provider `{other}` is not enabled in this build"
        ))),
    }
}
