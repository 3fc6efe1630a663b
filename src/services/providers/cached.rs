/// Read-through Redis cache in front of another metadata provider
///
/// Only successful fetches are cached. Failures always reach the caller fresh so
/// a provider outage is never pinned in the cache.
use std::sync::Arc;

use crate::{
    cached,
    models::{ItemId, MovieDetails},
    services::providers::{MetadataProvider, ProviderError},
    store::{Cache, CacheKey},
};

#[derive(Clone)]
pub struct CachedProvider {
    inner: Arc<dyn MetadataProvider>,
    cache: Cache,
    ttl_secs: u64,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MetadataProvider>, cache: Cache, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for CachedProvider {
    async fn fetch_details(&self, id: &ItemId) -> Result<MovieDetails, ProviderError> {
        cached!(
            self.cache,
            CacheKey::Metadata(id.clone()),
            self.ttl_secs,
            async move { self.inner.fetch_details(id).await }
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
