mod recommendation;
mod request;

pub use recommendation::{
    EnrichedRecommendation, Enrichment, MetadataInfo, NOT_AVAILABLE, POSTER_PLACEHOLDER,
    Recommendation, UNKNOWN_YEAR,
};
pub use request::{DEFAULT_MAX_RECOMMENDATIONS, RecommendationRequest};
