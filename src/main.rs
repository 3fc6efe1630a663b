use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinematch_api::{
    api::{create_router, AppState},
    config::Config,
    services::{
        providers::{cached::CachedProvider, tmdb::TmdbProvider, MetadataProvider},
        EnrichmentOrchestrator, MetadataEnricher, RecommendationLimits, RecommendationService,
    },
    store::{create_redis_client, Cache, CacheWriterHandle, Dataset},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let dataset = Dataset::load(&config.catalog_path, &config.similarity_path)
        .context("Failed to load catalog")?;

    let tmdb = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_url.clone(),
        config.metadata_timeout(),
    )?;

    let (provider, cache_handle): (Arc<dyn MetadataProvider>, Option<CacheWriterHandle>) =
        match &config.redis_url {
            Some(redis_url) => {
                let (cache, handle) =
                    Cache::new(create_redis_client(redis_url)?, config.cache_timeout()).await;
                tracing::info!(
                    ttl_secs = config.metadata_cache_ttl_secs,
                    timeout_ms = config.cache_timeout_ms,
                    "Metadata cache enabled"
                );
                let cached = CachedProvider::new(Arc::new(tmdb), cache, config.metadata_cache_ttl_secs);
                (Arc::new(cached), Some(handle))
            }
            None => (Arc::new(tmdb), None),
        };

    let enricher = MetadataEnricher::new(
        provider,
        config.metadata_timeout(),
        config.synopsis_max_chars,
    );
    let orchestrator = EnrichmentOrchestrator::new(
        enricher,
        config.enrichment_deadline(),
        config.max_concurrent_fetches,
    );
    let service = RecommendationService::new(
        dataset,
        orchestrator,
        RecommendationLimits {
            default_k: config.default_recommendations,
            max_k: config.max_recommendations,
        },
    );

    let app = create_router(AppState::new(service));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
