use serde::{Deserialize, Serialize};

/// Stands in for a missing `description` or `reasoning` on a generated item.
pub const NOT_AVAILABLE: &str = "Not available";

/// Poster shown when the metadata service has no image for a title.
pub const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750?text=No+Poster";

/// Year shown when the metadata service has no release date for a title.
pub const UNKNOWN_YEAR: &str = "unknown";

/// One title proposed by the model, in the model's relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub reasoning: String,
}

/// Poster and release year found for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataInfo {
    /// Fully resolved image URL
    pub poster_url: String,
    /// Four-digit release year, if the service reported a release date
    pub year: Option<String>,
}

/// Outcome of one enrichment lookup. Lookups never fail outward; every
/// failure path collapses into `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enrichment {
    Found(MetadataInfo),
    NotFound,
}

impl Enrichment {
    pub fn is_found(&self) -> bool {
        matches!(self, Enrichment::Found(_))
    }
}

/// A recommendation with its metadata attached, ready for display.
///
/// `poster_reference` and `year` are never empty: a missing poster becomes
/// [`POSTER_PLACEHOLDER`] and a missing year becomes [`UNKNOWN_YEAR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecommendation {
    /// 1-based position in the generator's output
    pub rank: usize,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    pub poster_reference: String,
    pub year: String,
}

impl EnrichedRecommendation {
    pub fn new(rank: usize, recommendation: Recommendation, enrichment: Enrichment) -> Self {
        let (poster_reference, year) = match enrichment {
            Enrichment::Found(info) => (
                info.poster_url,
                info.year.unwrap_or_else(|| UNKNOWN_YEAR.to_string()),
            ),
            Enrichment::NotFound => (POSTER_PLACEHOLDER.to_string(), UNKNOWN_YEAR.to_string()),
        };

        Self {
            rank,
            title: recommendation.title,
            description: recommendation.description,
            reasoning: recommendation.reasoning,
            poster_reference,
            year,
        }
    }

    pub fn has_poster(&self) -> bool {
        self.poster_reference != POSTER_PLACEHOLDER
    }
}
