/// CineBot: LLM-backed movie recommendations with poster and year metadata
///
/// # Overview
///
/// Given a movie the user liked and what they liked about it, CineBot asks a
/// hosted LLM for a ranked list of similar movies, validates the JSON it gets
/// back, and looks up each title on TMDB for a poster and release year.
///
/// Key features:
/// - One `CompletionProvider` trait with OpenAI-compatible (OpenAI, DeepSeek)
///   and Gemini adapters
/// - Tolerant parsing of fenced or bare JSON, strict schema checks, raw text
///   kept on every parse failure
/// - Bounded exponential-backoff retry around the LLM call only
/// - Best-effort enrichment that never drops or reorders a recommendation
///
/// # Quick Start
///
/// ```no_run
/// use cinebot::{Config, Pipeline, RecommendationRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     let pipeline = Pipeline::from_config(&config)?;
///
///     let request = RecommendationRequest::new("Drishyam", "tense plotting", 3, 10)?;
///     for movie in pipeline.run(&request).await? {
///         println!("{}. {} ({})", movie.rank, movie.title, movie.year);
///         println!("   {}", movie.reasoning);
///     }
///
///     Ok(())
/// }
/// ```
mod backend;
mod config;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod model;
pub mod pipeline;

// Re-exports for convenience
pub use backend::{
    CompletionProvider, CompletionRequest, RetryError, RetryPolicy, provider_from_config,
    strip_code_fence,
};
pub use config::{Config, ProviderKind};
pub use error::{CineBotError, GenerationError, ProviderError, Result, TransportError};
pub use model::{
    EnrichedRecommendation, Enrichment, MetadataInfo, NOT_AVAILABLE, POSTER_PLACEHOLDER,
    Recommendation, RecommendationRequest, UNKNOWN_YEAR,
};
pub use pipeline::{Generator, MetadataLookup, Pipeline, TmdbEnricher, parse_recommendations};

#[cfg(feature = "gemini")]
pub use backend::gemini::{GeminiClient, GeminiConfig};
#[cfg(feature = "openai")]
pub use backend::openai::{OpenAIClient, OpenAIConfig};
