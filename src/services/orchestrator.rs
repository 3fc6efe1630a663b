use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task::JoinSet, time::Instant};

use crate::{
    models::{Candidate, EnrichedRecommendation, Item, MetadataResult, UnavailableReason},
    services::{catalog::Catalog, enricher::MetadataEnricher},
};

/// Enriches a batch of candidates concurrently under one deadline
///
/// At most `max_concurrency` provider calls are in flight per batch. Whatever
/// has not finished when the deadline passes is aborted and reported as
/// unavailable; the batch never waits for stragglers. Dropping the batch future
/// aborts every fetch it started.
#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    enricher: MetadataEnricher,
    deadline: Duration,
    max_concurrency: usize,
}

impl EnrichmentOrchestrator {
    pub fn new(enricher: MetadataEnricher, deadline: Duration, max_concurrency: usize) -> Self {
        Self {
            enricher,
            deadline,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Returns one recommendation per candidate, in candidate order
    ///
    /// Candidates whose index is not in `catalog` are skipped; a
    /// [`Dataset`](crate::store::Dataset) guarantees every index it hands out is present.
    pub async fn enrich_all(
        &self,
        catalog: &Catalog,
        candidates: &[Candidate],
    ) -> Vec<EnrichedRecommendation> {
        let deadline = Instant::now() + self.deadline;
        let permits = Arc::new(Semaphore::new(self.max_concurrency));

        let slots: Vec<(Item, f64)> = candidates
            .iter()
            .filter_map(|candidate| {
                catalog
                    .get(candidate.index)
                    .map(|item| (item.clone(), candidate.score))
            })
            .collect();

        // Each task reports its slot position; results are placed by position.
        let mut tasks = JoinSet::new();
        for (position, (item, _)) in slots.iter().enumerate() {
            let enricher = self.enricher.clone();
            let permits = Arc::clone(&permits);
            let item = item.clone();
            tasks.spawn(async move {
                let metadata = match permits.acquire_owned().await {
                    Ok(_permit) => enricher.fetch(&item).await,
                    Err(_) => MetadataResult::unavailable(UnavailableReason::TaskFailed),
                };
                (position, metadata)
            });
        }

        let mut results: Vec<Option<MetadataResult>> = vec![None; slots.len()];
        let mut deadline_exceeded = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((position, metadata)))) => results[position] = Some(metadata),
                Ok(Some(Err(e))) => {
                    tracing::error!(error = %e, "Enrichment task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    deadline_exceeded = true;
                    break;
                }
            }
        }

        let mut recommendations = Vec::with_capacity(slots.len());
        let mut unavailable = 0usize;

        for ((item, score), metadata) in slots.into_iter().zip(results) {
            let metadata = metadata.unwrap_or_else(|| {
                if deadline_exceeded {
                    tracing::warn!(item_id = %item.id, "Enrichment deadline exceeded");
                    MetadataResult::unavailable(UnavailableReason::DeadlineExceeded)
                } else {
                    MetadataResult::unavailable(UnavailableReason::TaskFailed)
                }
            });

            if !metadata.is_available() {
                unavailable += 1;
            }

            recommendations.push(EnrichedRecommendation {
                item,
                similarity_score: score,
                metadata,
            });
        }

        tracing::info!(
            total = recommendations.len(),
            unavailable,
            deadline_exceeded,
            "Enrichment batch completed"
        );

        recommendations
    }
}
