use async_trait::async_trait;

use crate::error::ProviderError;

/// A prompt ready to send: a system instruction plus one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// CompletionProvider is the one seam between the pipeline and an LLM vendor.
///
/// Each adapter sends a single non-streaming request and normalizes the
/// vendor's response envelope into one plain text string. The crate ships:
/// - `OpenAIClient` for OpenAI-compatible chat completions (OpenAI, DeepSeek)
/// - `GeminiClient` for Google's generateContent API
///
/// Adapters never retry; the generator wraps them in a
/// [`RetryPolicy`](crate::RetryPolicy).
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use cinebot::{CompletionProvider, CompletionRequest, OpenAIClient};
///
/// let client = OpenAIClient::deepseek("your-deepseek-api-key")?
///     .temperature(0.8)
///     .max_tokens(500);
///
/// let text = client
///     .complete(&CompletionRequest::new(
///         "You are a movie recommendation expert.",
///         "Suggest one thriller.",
///     ))
///     .await?;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the request and return the generated text.
    ///
    /// Fails with `ProviderError::NoChoices` when the envelope carries no
    /// generated text, and `ProviderError::Transport` for anything that went
    /// wrong on the wire.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
