use serde::Serialize;

use crate::error::{CineBotError, Result};

/// Upper bound on `count` when no maximum is configured.
pub const DEFAULT_MAX_RECOMMENDATIONS: u32 = 10;

/// Input to a pipeline run: the movie the user liked, what they liked about
/// it, and how many recommendations to ask for.
///
/// Build one with [`RecommendationRequest::new`], which trims both text
/// fields and range-checks `count`, so an invalid request never reaches the
/// generator.
///
/// ```
/// use cinebot::RecommendationRequest;
///
/// let request = RecommendationRequest::new("  Drishyam ", "tense plotting", 3, 10).unwrap();
/// assert_eq!(request.seed_title(), "Drishyam");
///
/// assert!(RecommendationRequest::new("Drishyam", "   ", 3, 10).is_err());
/// assert!(RecommendationRequest::new("Drishyam", "tense plotting", 11, 10).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRequest {
    seed_title: String,
    liked_aspect: String,
    count: u32,
}

impl RecommendationRequest {
    pub fn new(
        seed_title: impl AsRef<str>,
        liked_aspect: impl AsRef<str>,
        count: u32,
        max_count: u32,
    ) -> Result<Self> {
        let seed_title = seed_title.as_ref().trim();
        let liked_aspect = liked_aspect.as_ref().trim();

        if seed_title.is_empty() {
            return Err(CineBotError::InvalidRequest(
                "movie title cannot be empty".to_string(),
            ));
        }
        if liked_aspect.is_empty() {
            return Err(CineBotError::InvalidRequest(
                "liked aspect cannot be empty".to_string(),
            ));
        }
        if count == 0 || count > max_count {
            return Err(CineBotError::InvalidRequest(format!(
                "count must be between 1 and {max_count}, got {count}"
            )));
        }

        Ok(Self {
            seed_title: seed_title.to_string(),
            liked_aspect: liked_aspect.to_string(),
            count,
        })
    }

    pub fn seed_title(&self) -> &str {
        &self.seed_title
    }

    pub fn liked_aspect(&self) -> &str {
        &self.liked_aspect
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
