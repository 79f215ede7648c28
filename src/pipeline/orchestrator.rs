use tracing::{debug, info, instrument, warn};

use crate::backend::provider_from_config;
use crate::config::Config;
use crate::error::{CineBotError, Result};
use crate::model::{EnrichedRecommendation, RecommendationRequest};
use crate::pipeline::{Generator, MetadataLookup, TmdbEnricher};

/// Generator followed by per-title enrichment.
///
/// One run makes one generator call, then one enrichment lookup per
/// recommendation in rank order. Generator failures come back unchanged;
/// enrichment failures only cost the poster.
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use cinebot::{Config, Pipeline, RecommendationRequest};
///
/// let config = Config::from_env()?;
/// let pipeline = Pipeline::from_config(&config)?;
/// let request = RecommendationRequest::new(
///     "Drishyam",
///     "tense plotting",
///     3,
///     pipeline.max_recommendations(),
/// )?;
///
/// for item in pipeline.run(&request).await? {
///     println!("{}. {} ({})", item.rank, item.title, item.year);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    generator: Generator,
    enricher: Box<dyn MetadataLookup>,
    max_recommendations: u32,
}

impl Pipeline {
    pub fn new(generator: Generator, enricher: Box<dyn MetadataLookup>) -> Self {
        Self {
            generator,
            enricher,
            max_recommendations: crate::model::DEFAULT_MAX_RECOMMENDATIONS,
        }
    }

    pub fn with_max_recommendations(mut self, max: u32) -> Self {
        self.max_recommendations = max.max(1);
        self
    }

    /// Wire up the configured LLM provider and TMDB.
    ///
    /// Fails with `CineBotError::Configuration` if the provider's API key is
    /// absent. A missing TMDB key is not an error; posters are simply skipped.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut generator = Generator::new(provider_from_config(config)?)
            .with_retry_policy(config.generator_retry_policy()?);
        if let Some(location) = config
            .viewer_location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            generator = generator.with_viewer_location(location);
        }

        let enricher = TmdbEnricher::new(config.tmdb_api_key().map(str::to_string))
            .base_url(config.tmdb_base_url.as_str())
            .image_base_url(config.tmdb_image_base_url.as_str())
            .timeout(config.tmdb_timeout())
            .retry_policy(config.enricher_retry_policy());

        Ok(Self::new(generator, Box::new(enricher))
            .with_max_recommendations(config.max_recommendations))
    }

    pub fn max_recommendations(&self) -> u32 {
        self.max_recommendations
    }

    /// Run the pipeline for one request.
    ///
    /// The result holds one entry per generated recommendation, in the
    /// generator's order, never more than `request.count()`. A request asking
    /// for more than [`Pipeline::max_recommendations`] is rejected with
    /// `CineBotError::InvalidRequest` before the provider is called.
    #[instrument(
        name = "pipeline_run",
        skip(self, request),
        fields(
            provider = self.generator.provider_name(),
            seed_title = %request.seed_title(),
            count = request.count()
        )
    )]
    pub async fn run(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<EnrichedRecommendation>> {
        if request.count() > self.max_recommendations {
            warn!(
                max = self.max_recommendations,
                "Request asks for more recommendations than allowed"
            );
            return Err(CineBotError::InvalidRequest(format!(
                "count must be at most {}, got {}",
                self.max_recommendations,
                request.count()
            )));
        }

        info!("Generating recommendations");
        let recommendations = self.generator.generate(request).await?;
        info!(generated = recommendations.len(), "Enriching recommendations");

        let mut enriched = Vec::with_capacity(recommendations.len());
        for (index, recommendation) in recommendations.into_iter().enumerate() {
            let rank = index + 1;
            let enrichment = self.enricher.enrich(&recommendation.title).await;
            debug!(
                rank,
                title = %recommendation.title,
                found = enrichment.is_found(),
                "Enriched recommendation"
            );
            enriched.push(EnrichedRecommendation::new(rank, recommendation, enrichment));
        }

        info!(
            returned = enriched.len(),
            with_poster = enriched.iter().filter(|r| r.has_poster()).count(),
            "Pipeline finished"
        );
        Ok(enriched)
    }
}
