use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Item, ItemId, RecommendationResponse},
    services::Seed,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub items: usize,
    pub index_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<Item>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movies: Vec<Item>,
    pub count: usize,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Body of `POST /recommend`; `id` takes precedence over `title`
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub id: Option<ItemId>,
    pub title: Option<String>,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub k: Option<usize>,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        items: state.service.item_count(),
        index_loaded: state.service.index_loaded(),
    })
}

/// List every movie in the catalog
pub async fn list_movies(State(state): State<AppState>) -> Json<MoviesResponse> {
    let movies = state.service.list_all().to_vec();
    Json(MoviesResponse {
        count: movies.len(),
        movies,
    })
}

/// Search movies by title substring
pub async fn search_movies(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<SearchResponse>> {
    let Query(params) = query?;
    let query = params.q.unwrap_or_default();
    let movies = state.service.search(&query)?;

    Ok(Json(SearchResponse {
        count: movies.len(),
        movies,
        query: query.trim().to_string(),
    }))
}

/// Recommend movies similar to one named by id or title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = body?;

    let seed = match (request.id, request.title) {
        (Some(id), _) => Seed::Id(id),
        (None, Some(title)) => Seed::Title(title),
        (None, None) => {
            return Err(AppError::InvalidInput(
                "Movie id or title is required".to_string(),
            ))
        }
    };

    tracing::info!(
        request_id = %request_id,
        seed = ?seed,
        k = ?request.k,
        "Processing recommendation request"
    );

    let response = state.service.recommend(seed, request.k).await?;
    Ok(Json(response))
}

/// Recommend movies similar to the movie with the given id
pub async fn recommend_for_movie(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(params) = query?;
    let id = ItemId::parse(&id);

    tracing::info!(
        request_id = %request_id,
        item_id = %id,
        k = ?params.k,
        "Processing recommendation request"
    );

    let response = state.service.recommend(Seed::Id(id), params.k).await?;
    Ok(Json(response))
}
