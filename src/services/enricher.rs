use std::{sync::Arc, time::Duration};

use chrono::Utc;

use crate::{
    models::{Item, MetadataResult, MovieDetails, MovieMetadata, UnavailableReason},
    services::providers::MetadataProvider,
};

/// Placeholder for a synopsis the provider did not supply
pub const NO_OVERVIEW: &str = "No overview available";

const ELLIPSIS: &str = "...";

/// Fail-soft client to the metadata provider
///
/// One attempt per call, bounded by `timeout`. Every failure is folded into
/// [`MetadataResult::Unavailable`]; `fetch` never returns an error.
#[derive(Clone)]
pub struct MetadataEnricher {
    provider: Arc<dyn MetadataProvider>,
    timeout: Duration,
    synopsis_max_chars: usize,
}

impl MetadataEnricher {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        timeout: Duration,
        synopsis_max_chars: usize,
    ) -> Self {
        Self {
            provider,
            timeout,
            synopsis_max_chars,
        }
    }

    pub async fn fetch(&self, item: &Item) -> MetadataResult {
        let outcome = tokio::time::timeout(self.timeout, self.provider.fetch_details(&item.id)).await;

        match outcome {
            Ok(Ok(details)) => MetadataResult::Available(self.to_metadata(details)),
            Ok(Err(e)) => {
                tracing::warn!(
                    item_id = %item.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Metadata unavailable"
                );
                MetadataResult::unavailable(e.reason())
            }
            Err(_) => {
                tracing::warn!(
                    item_id = %item.id,
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Metadata request timed out"
                );
                MetadataResult::unavailable(UnavailableReason::Timeout)
            }
        }
    }

    fn to_metadata(&self, details: MovieDetails) -> MovieMetadata {
        MovieMetadata {
            rating: details.rating,
            release_date: details.release_date,
            overview: excerpt(details.overview.as_deref(), self.synopsis_max_chars),
            runtime_minutes: details.runtime,
            genres: details.genres,
            poster_url: details.poster_url,
            fetched_at: Utc::now(),
        }
    }
}

/// Cuts a synopsis to `max_chars` characters and appends an ellipsis
///
/// Missing or blank text becomes [`NO_OVERVIEW`].
pub fn excerpt(overview: Option<&str>, max_chars: usize) -> String {
    match overview.map(str::trim) {
        Some(text) if !text.is_empty() => {
            let mut excerpt: String = text.chars().take(max_chars).collect();
            excerpt.push_str(ELLIPSIS);
            excerpt
        }
        _ => NO_OVERVIEW.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use crate::services::providers::{MockMetadataProvider, ProviderError};

    fn item(id: u64) -> Item {
        Item {
            id: ItemId::Numeric(id),
            title: format!("Movie {}", id),
            index: 0,
        }
    }

    fn enricher(provider: MockMetadataProvider) -> MetadataEnricher {
        MetadataEnricher::new(Arc::new(provider), Duration::from_secs(1), 10)
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        assert_eq!(excerpt(Some("abcdefghijklmnop"), 10), "abcdefghij...");
    }

    #[test]
    fn test_excerpt_short_text_kept_whole() {
        assert_eq!(excerpt(Some("short"), 10), "short...");
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        assert_eq!(excerpt(Some("Amélie Poulain"), 6), "Amélie...");
    }

    #[test]
    fn test_excerpt_placeholder_for_missing_text() {
        assert_eq!(excerpt(None, 10), NO_OVERVIEW);
        assert_eq!(excerpt(Some(""), 10), NO_OVERVIEW);
        assert_eq!(excerpt(Some("   "), 10), NO_OVERVIEW);
    }

    #[tokio::test]
    async fn test_fetch_success_maps_details() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch_details().returning(|_| {
            Ok(MovieDetails {
                rating: Some(7.5),
                release_date: Some("1999-03-30".to_string()),
                overview: Some("A computer hacker learns the truth".to_string()),
                runtime: Some(136),
                genres: vec!["Action".to_string(), "Science Fiction".to_string()],
                poster_url: None,
            })
        });
        provider.expect_name().return_const("mock");

        let result = enricher(provider).fetch(&item(603)).await;

        match result {
            MetadataResult::Available(metadata) => {
                assert_eq!(metadata.rating, Some(7.5));
                assert_eq!(metadata.overview, "A computer...");
                assert_eq!(metadata.runtime_minutes, Some(136));
                assert_eq!(metadata.genres.len(), 2);
            }
            other => panic!("expected live metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_overview_uses_placeholder() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_fetch_details()
            .returning(|_| Ok(MovieDetails::default()));
        provider.expect_name().return_const("mock");

        let result = enricher(provider).fetch(&item(1)).await;

        match result {
            MetadataResult::Available(metadata) => assert_eq!(metadata.overview, NO_OVERVIEW),
            other => panic!("expected live metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_provider_errors_become_unavailable() {
        let cases = [
            (ProviderError::Timeout, UnavailableReason::Timeout),
            (
                ProviderError::Transport("connection refused".into()),
                UnavailableReason::Transport,
            ),
            (ProviderError::Status(404), UnavailableReason::UpstreamStatus),
            (
                ProviderError::Malformed("expected value".into()),
                UnavailableReason::MalformedPayload,
            ),
        ];

        for (error, expected) in cases {
            let mut provider = MockMetadataProvider::new();
            provider
                .expect_fetch_details()
                .times(1)
                .returning(move |_| Err(error.clone()));
            provider.expect_name().return_const("mock");

            let result = enricher(provider).fetch(&item(1)).await;
            assert_eq!(result, MetadataResult::unavailable(expected));
        }
    }

    struct StalledProvider;

    #[async_trait::async_trait]
    impl MetadataProvider for StalledProvider {
        async fn fetch_details(&self, _id: &ItemId) -> Result<MovieDetails, ProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(MovieDetails::default())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let enricher =
            MetadataEnricher::new(Arc::new(StalledProvider), Duration::from_millis(50), 200);

        let started = std::time::Instant::now();
        let result = enricher.fetch(&item(1)).await;

        assert_eq!(result, MetadataResult::unavailable(UnavailableReason::Timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
