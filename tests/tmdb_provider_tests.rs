use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use cinematch_api::{
    models::{Item, ItemId, MetadataResult, UnavailableReason},
    services::{
        providers::{tmdb::TmdbProvider, MetadataProvider, ProviderError},
        MetadataEnricher,
    },
};

const API_KEY: &str = "test_key";

/// Stand-in for `/3/movie/{id}` with a few scripted behaviours
async fn fake_movie(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("api_key").map(String::as_str) != Some(API_KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match id.as_str() {
        "19995" => Json(json!({
            "id": 19995,
            "title": "Avatar",
            "vote_average": 7.2,
            "release_date": "2009-12-10",
            "overview": "In the 22nd century, a paraplegic Marine is dispatched to the moon Pandora on a unique mission.",
            "runtime": 162,
            "genres": [{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}],
            "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        }))
        .into_response(),
        "garbage" => (StatusCode::OK, "{not json").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({})).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"status_message": "The resource you requested could not be found."})),
        )
            .into_response(),
    }
}

async fn spawn_fake_tmdb() -> String {
    let app = Router::new().route("/3/movie/:id", get(fake_movie));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/3", addr)
}

fn provider(api_url: String, api_key: &str, timeout: Duration) -> TmdbProvider {
    TmdbProvider::new(
        api_key.to_string(),
        api_url,
        "https://image.tmdb.org/t/p/w500".to_string(),
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_details_success() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb = provider(api_url, API_KEY, Duration::from_secs(2));

    let details = tmdb.fetch_details(&ItemId::Numeric(19995)).await.unwrap();

    assert_eq!(details.rating, Some(7.2));
    assert_eq!(details.release_date.as_deref(), Some("2009-12-10"));
    assert_eq!(details.runtime, Some(162));
    assert_eq!(details.genres, vec!["Action", "Adventure"]);
    assert_eq!(
        details.poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/kyeqWdyUXW608qlYkRqosgbbJyK.jpg")
    );
}

#[tokio::test]
async fn test_fetch_details_not_found_status() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb = provider(api_url, API_KEY, Duration::from_secs(2));

    let result = tmdb.fetch_details(&ItemId::Numeric(1)).await;
    assert_eq!(result.unwrap_err(), ProviderError::Status(404));
}

#[tokio::test]
async fn test_fetch_details_bad_api_key() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb = provider(api_url, "wrong", Duration::from_secs(2));

    let result = tmdb.fetch_details(&ItemId::Numeric(19995)).await;
    assert_eq!(result.unwrap_err(), ProviderError::Status(401));
}

#[tokio::test]
async fn test_fetch_details_malformed_payload() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb = provider(api_url, API_KEY, Duration::from_secs(2));

    let result = tmdb.fetch_details(&ItemId::Text("garbage".into())).await;
    assert!(matches!(result, Err(ProviderError::Malformed(_))));
}

#[tokio::test]
async fn test_fetch_details_timeout() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb = provider(api_url, API_KEY, Duration::from_millis(200));

    let result = tmdb.fetch_details(&ItemId::Text("slow".into())).await;
    assert_eq!(result.unwrap_err(), ProviderError::Timeout);
}

#[tokio::test]
async fn test_fetch_details_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tmdb = provider(format!("http://{}/3", addr), API_KEY, Duration::from_secs(2));

    let result = tmdb.fetch_details(&ItemId::Numeric(19995)).await;
    assert!(matches!(result, Err(ProviderError::Transport(_))));
}

#[tokio::test]
async fn test_enricher_over_tmdb() {
    let api_url = spawn_fake_tmdb().await;
    let tmdb: Arc<dyn MetadataProvider> =
        Arc::new(provider(api_url, API_KEY, Duration::from_secs(2)));
    let enricher = MetadataEnricher::new(tmdb, Duration::from_secs(2), 19);

    let avatar = Item {
        id: ItemId::Numeric(19995),
        title: "Avatar".to_string(),
        index: 0,
    };
    match enricher.fetch(&avatar).await {
        MetadataResult::Available(metadata) => {
            assert_eq!(metadata.overview, "In the 22nd century...");
            assert_eq!(metadata.genres, vec!["Action", "Adventure"]);
        }
        other => panic!("expected live metadata, got {:?}", other),
    }

    let missing = Item {
        id: ItemId::Numeric(2),
        title: "Missing".to_string(),
        index: 1,
    };
    assert_eq!(
        enricher.fetch(&missing).await,
        MetadataResult::unavailable(UnavailableReason::UpstreamStatus)
    );
}
