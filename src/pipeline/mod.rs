//! The recommendation pipeline: generate with the LLM, then enrich each
//! title with TMDB metadata.

mod enricher;
mod generator;
mod orchestrator;
mod parse;

pub use enricher::{MetadataLookup, TMDB_BASE_URL, TMDB_IMAGE_BASE_URL, TmdbEnricher};
pub use generator::{Generator, SYSTEM_INSTRUCTION};
pub use orchestrator::Pipeline;
pub use parse::parse_recommendations;
