use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::backend::RetryPolicy;
use crate::error::{CineBotError, Result};
use crate::model::DEFAULT_MAX_RECOMMENDATIONS;
use crate::pipeline::{TMDB_BASE_URL, TMDB_IMAGE_BASE_URL};

/// Which LLM provider generates recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    DeepSeek,
    Gemini,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// LLM provider used by the generator
    #[serde(default = "default_llm_provider")]
    pub llm_provider: ProviderKind,

    pub openai_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    /// Model override; each provider has its own default
    pub llm_model: Option<String>,

    /// Endpoint override for OpenAI-compatible or Gemini-compatible servers
    pub llm_base_url: Option<String>,

    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Attempt budget for the provider call, first attempt included
    #[serde(default = "default_llm_retry_attempts")]
    pub llm_retry_attempts: u32,

    #[serde(default = "default_llm_retry_base_delay_secs")]
    pub llm_retry_base_delay_secs: f64,

    #[serde(default = "default_llm_retry_multiplier")]
    pub llm_retry_multiplier: u32,

    /// TMDB API key; without it every enrichment is NotFound
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    #[serde(default = "default_tmdb_timeout_secs")]
    pub tmdb_timeout_secs: u64,

    /// Attempt budget for metadata lookups; 1 means no retries
    #[serde(default = "default_tmdb_retry_attempts")]
    pub tmdb_retry_attempts: u32,

    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: u32,

    /// Optional audience hint added to the prompt, e.g. "Bengaluru, India"
    pub viewer_location: Option<String>,
}

fn default_llm_provider() -> ProviderKind {
    ProviderKind::DeepSeek
}

fn default_llm_temperature() -> f32 {
    0.8
}

fn default_llm_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_llm_retry_attempts() -> u32 {
    3
}

fn default_llm_retry_base_delay_secs() -> f64 {
    2.0
}

fn default_llm_retry_multiplier() -> u32 {
    2
}

fn default_tmdb_base_url() -> String {
    TMDB_BASE_URL.to_string()
}

fn default_tmdb_image_base_url() -> String {
    TMDB_IMAGE_BASE_URL.to_string()
}

fn default_tmdb_timeout_secs() -> u64 {
    10
}

fn default_tmdb_retry_attempts() -> u32 {
    1
}

fn default_max_recommendations() -> u32 {
    DEFAULT_MAX_RECOMMENDATIONS
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first
    /// if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map_err(|e| CineBotError::Configuration(format!("Failed to load config: {e}")))
    }

    /// Load configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| CineBotError::Configuration(format!("Failed to load config: {e}")))
    }

    /// API key for the selected provider.
    pub fn llm_api_key(&self) -> Result<&str> {
        let key = match self.llm_provider {
            ProviderKind::OpenAI => self.openai_api_key.as_deref(),
            ProviderKind::DeepSeek => self.deepseek_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
        };

        key.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
            CineBotError::Configuration(format!(
                "{} is not set (required for provider `{}`)",
                self.llm_provider.api_key_var(),
                self.llm_provider
            ))
        })
    }

    /// TMDB key, if one is configured and non-blank.
    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn tmdb_timeout(&self) -> Duration {
        Duration::from_secs(self.tmdb_timeout_secs)
    }

    /// Retry policy around the generator's provider call.
    pub fn generator_retry_policy(&self) -> Result<RetryPolicy> {
        let base_delay = Duration::try_from_secs_f64(self.llm_retry_base_delay_secs)
            .map_err(|e| {
                CineBotError::Configuration(format!("Invalid LLM_RETRY_BASE_DELAY_SECS: {e}"))
            })?;
        Ok(RetryPolicy::new(
            self.llm_retry_attempts,
            base_delay,
            self.llm_retry_multiplier,
        ))
    }

    /// Retry policy around metadata lookups; a single attempt by default.
    pub fn enricher_retry_policy(&self) -> RetryPolicy {
        if self.tmdb_retry_attempts <= 1 {
            RetryPolicy::no_retry()
        } else {
            RetryPolicy::new(self.tmdb_retry_attempts, Duration::from_millis(500), 2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("DEEPSEEK_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm_provider, ProviderKind::DeepSeek);
        assert_eq!(config.llm_api_key().unwrap(), "sk-test");
        assert_eq!(config.llm_temperature, 0.8);
        assert_eq!(config.llm_max_tokens, 1000);
        assert_eq!(config.max_recommendations, 10);
        assert_eq!(config.tmdb_timeout(), Duration::from_secs(10));
        assert_eq!(config.tmdb_api_key(), None);
        assert_eq!(config.tmdb_base_url, TMDB_BASE_URL);
        assert_eq!(config.tmdb_image_base_url, TMDB_IMAGE_BASE_URL);
        assert_eq!(config.generator_retry_policy().unwrap(), RetryPolicy::default());
        assert_eq!(config.enricher_retry_policy(), RetryPolicy::no_retry());
    }

    #[test]
    fn test_missing_key_for_selected_provider() {
        let config = Config::from_vars(vars(&[
            ("LLM_PROVIDER", "gemini"),
            ("DEEPSEEK_API_KEY", "sk-test"),
        ]))
        .unwrap();
        let err = config.llm_api_key().unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_keys_count_as_missing() {
        let config = Config::from_vars(vars(&[
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "   "),
            ("TMDB_API_KEY", ""),
        ]))
        .unwrap();
        assert!(config.llm_api_key().is_err());
        assert_eq!(config.tmdb_api_key(), None);
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let err = Config::from_vars(vars(&[("LLM_PROVIDER", "cohere")])).unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = Config::from_vars(vars(&[
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("LLM_RETRY_BASE_DELAY_SECS", "-1"),
        ]))
        .unwrap();
        assert!(config.generator_retry_policy().is_err());
    }
}
