/// TMDB (The Movie Database) metadata provider
///
/// Looks up `/movie/{id}` and maps rating, release date, overview, runtime, genres
/// and poster path into [`MovieDetails`].
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    models::{ItemId, MovieDetails, TmdbMovie},
    services::providers::{MetadataProvider, ProviderError},
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP client enforces `timeout` on every request
    pub fn new(
        api_key: String,
        api_url: String,
        image_url: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
        })
    }

    fn convert_api_response(&self, movie: TmdbMovie) -> MovieDetails {
        let poster_url = movie
            .poster_path
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}/{}", self.image_url, path.trim_start_matches('/')));

        MovieDetails {
            rating: movie.vote_average,
            release_date: movie.release_date.filter(|date| !date.is_empty()),
            overview: movie.overview,
            runtime: movie.runtime,
            genres: movie.genres.into_iter().map(|genre| genre.name).collect(),
            poster_url,
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_details(&self, id: &ItemId) -> Result<MovieDetails, ProviderError> {
        let url = format!("{}/movie/{}", self.api_url, id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::debug!(
                item_id = %id,
                status = %status,
                provider = "tmdb",
                "Metadata request rejected"
            );
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let movie: TmdbMovie =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        tracing::debug!(item_id = %id, provider = "tmdb", "Metadata fetched");

        Ok(self.convert_api_response(movie))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
