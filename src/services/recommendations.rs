use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemId, RecommendationResponse},
    services::{orchestrator::EnrichmentOrchestrator, similarity::IndexError},
    store::Dataset,
};

/// How a request names the item to seed recommendations from
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    /// Exact catalog identity
    Id(ItemId),
    /// Free text matched case-insensitively against titles
    Title(String),
}

/// Phases a recommendation request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolving,
    Retrieving,
    Enriching,
    Assembled,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            Phase::Resolving => "resolving",
            Phase::Retrieving => "retrieving",
            Phase::Enriching => "enriching",
            Phase::Assembled => "assembled",
        };
        write!(f, "{}", phase)
    }
}

/// Limits applied to the requested recommendation count
#[derive(Debug, Clone, Copy)]
pub struct RecommendationLimits {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: 25,
        }
    }
}

/// Façade over catalog lookup, similarity retrieval and enrichment
///
/// Owns the read-only [`Dataset`]; share it behind an `Arc`.
pub struct RecommendationService {
    dataset: Dataset,
    orchestrator: EnrichmentOrchestrator,
    limits: RecommendationLimits,
}

impl RecommendationService {
    pub fn new(
        dataset: Dataset,
        orchestrator: EnrichmentOrchestrator,
        limits: RecommendationLimits,
    ) -> Self {
        Self {
            dataset,
            orchestrator,
            limits,
        }
    }

    /// All catalog items in catalog order
    pub fn list_all(&self) -> &[Item] {
        self.dataset.catalog.items()
    }

    /// Items whose title contains `query`, ignoring case, in catalog order
    pub fn search(&self, query: &str) -> AppResult<Vec<Item>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Query parameter is required".to_string(),
            ));
        }

        Ok(self.items_at(&self.dataset.catalog.resolve_by_title_substring(query)))
    }

    pub fn item_count(&self) -> usize {
        self.dataset.catalog.size()
    }

    pub fn index_loaded(&self) -> bool {
        self.dataset.index.is_loaded()
    }

    /// Recommends up to `k` items similar to the seed, enriched with metadata
    ///
    /// `k` defaults to the configured count. Only resolution and retrieval can
    /// fail; metadata problems are reported inside the response.
    pub async fn recommend(&self, seed: Seed, k: Option<usize>) -> AppResult<RecommendationResponse> {
        let k = self.validate_k(k)?;

        tracing::debug!(phase = %Phase::Resolving, seed = ?seed, k, "Recommendation request");
        let matches = self.resolve(&seed)?;
        let input = matches
            .first()
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No item matches {:?}", seed)))?;

        tracing::debug!(phase = %Phase::Retrieving, item_id = %input.id, "Seed resolved");
        let candidates = self
            .dataset
            .index
            .top_k(input.index, k)
            .map_err(|e| match e {
                IndexError::IndexUnavailable => AppError::IndexUnavailable(e.to_string()),
                IndexError::IndexOutOfRange { .. } => AppError::Internal(e.to_string()),
            })?;

        let recommendations = if candidates.is_empty() {
            Vec::new()
        } else {
            tracing::debug!(
                phase = %Phase::Enriching,
                candidates = candidates.len(),
                "Candidates retrieved"
            );
            self.orchestrator
                .enrich_all(&self.dataset.catalog, &candidates)
                .await
        };

        tracing::info!(
            phase = %Phase::Assembled,
            item_id = %input.id,
            count = recommendations.len(),
            "Recommendations assembled"
        );

        Ok(RecommendationResponse {
            input,
            matches,
            count: recommendations.len(),
            recommendations,
        })
    }

    fn validate_k(&self, k: Option<usize>) -> AppResult<usize> {
        let k = k.unwrap_or(self.limits.default_k);
        if k > self.limits.max_k {
            return Err(AppError::InvalidInput(format!(
                "k must be at most {}, got {}",
                self.limits.max_k, k
            )));
        }
        Ok(k)
    }

    /// Resolves a seed to its matching items; the first is the recommendation seed
    fn resolve(&self, seed: &Seed) -> AppResult<Vec<Item>> {
        let catalog = &self.dataset.catalog;
        match seed {
            Seed::Id(id) => {
                let index = catalog.resolve(id)?;
                Ok(self.items_at(&[index]))
            }
            Seed::Title(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(AppError::InvalidInput("Movie title is required".to_string()));
                }
                let matches = self.items_at(&catalog.resolve_by_title_substring(title));
                if matches.is_empty() {
                    return Err(AppError::NotFound(format!("Movie \"{}\" not found", title)));
                }
                if matches.len() > 1 {
                    tracing::debug!(
                        query = %title,
                        matches = matches.len(),
                        "Ambiguous title, using first catalog match"
                    );
                }
                Ok(matches)
            }
        }
    }

    fn items_at(&self, indices: &[usize]) -> Vec<Item> {
        indices
            .iter()
            .filter_map(|&index| self.dataset.catalog.get(index))
            .cloned()
            .collect()
    }
}
