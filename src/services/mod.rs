pub mod catalog;
pub mod enricher;
pub mod orchestrator;
pub mod providers;
pub mod recommendations;
pub mod similarity;

pub use catalog::Catalog;
pub use enricher::MetadataEnricher;
pub use orchestrator::EnrichmentOrchestrator;
pub use recommendations::{RecommendationLimits, RecommendationService, Seed};
pub use similarity::{SimilarityIndex, SimilarityMatrix};
