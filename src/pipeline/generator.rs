use chrono::Datelike;
use tracing::{info, instrument, warn};

use crate::backend::{CompletionProvider, CompletionRequest, RetryError, RetryPolicy};
use crate::error::{GenerationError, ProviderError};
use crate::model::{Recommendation, RecommendationRequest};
use crate::pipeline::parse_recommendations;

/// System instruction sent with every recommendation prompt.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a movie recommendation expert. Always respond with valid JSON only.";

/// Asks the LLM for a ranked list of recommendations and validates the reply.
///
/// Transport failures are retried under the generator's [`RetryPolicy`];
/// malformed or mis-shaped output is returned immediately.
pub struct Generator {
    provider: Box<dyn CompletionProvider>,
    retry_policy: RetryPolicy,
    viewer_location: Option<String>,
}

impl Generator {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            retry_policy: RetryPolicy::default(),
            viewer_location: None,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Mention where the viewer is, so the model can favour what is watchable there.
    pub fn with_viewer_location(mut self, location: impl Into<String>) -> Self {
        self.viewer_location = Some(location.into());
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Render the prompt for `request`. Title and liked aspect are embedded verbatim.
    pub fn build_prompt(&self, request: &RecommendationRequest) -> CompletionRequest {
        let mut prompt = format!(
            "Recommend exactly {count} movies for someone who liked \"{title}\".\n\
             What they liked about it: {aspect}\n\
             Order the list from most to least relevant.\n\
             Current year: {year}\n",
            count = request.count(),
            title = request.seed_title(),
            aspect = request.liked_aspect(),
            year = chrono::Local::now().year(),
        );
        if let Some(location) = &self.viewer_location {
            prompt.push_str(&format!("Viewer location: {location}\n"));
        }
        prompt.push_str(
            "\nRespond with ONLY a JSON object in exactly this format, with no other text:\n\
             {\"recommendations\": [{\"title\": \"Movie Title\", \
             \"description\": \"2-3 sentence description of the movie\", \
             \"reasoning\": \"Why this movie matches what the user liked\"}]}",
        );

        CompletionRequest::new(SYSTEM_INSTRUCTION, prompt)
    }

    /// Generate at most `request.count()` recommendations, most relevant first.
    #[instrument(
        name = "generate_recommendations",
        skip(self, request),
        fields(
            provider = self.provider.name(),
            seed_title = %request.seed_title(),
            count = request.count()
        )
    )]
    pub async fn generate(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Recommendation>, GenerationError> {
        let completion = self.build_prompt(request);

        let raw_text = self
            .retry_policy
            .run(
                self.provider.name(),
                || self.provider.complete(&completion),
                ProviderError::is_retryable,
            )
            .await
            .map_err(into_generation_error)?;

        let mut recommendations = parse_recommendations(&raw_text)?;

        let count = request.count() as usize;
        if recommendations.len() > count {
            warn!(
                returned = recommendations.len(),
                requested = count,
                "Model returned more recommendations than requested, truncating"
            );
            recommendations.truncate(count);
        } else if recommendations.len() < count {
            info!(
                returned = recommendations.len(),
                requested = count,
                "Model returned fewer recommendations than requested"
            );
        }

        Ok(recommendations)
    }
}

fn into_generation_error(err: RetryError<ProviderError>) -> GenerationError {
    match err {
        RetryError::Exhausted {
            attempts,
            last_error: ProviderError::Transport(last_error),
        } => GenerationError::TransportExhausted {
            attempts,
            last_error,
        },
        RetryError::Permanent {
            error: ProviderError::Transport(source),
            ..
        } => GenerationError::ProviderRejected { source },
        RetryError::Exhausted {
            last_error: ProviderError::NoChoices,
            ..
        }
        | RetryError::Permanent {
            error: ProviderError::NoChoices,
            ..
        } => GenerationError::NoChoices,
    }
}
