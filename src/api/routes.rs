//! HTTP routes and handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::response::{ApiError, ApiResponse};
use crate::app::AppState;
use crate::cache::CacheStatus;

type Shared = State<Arc<AppState>>;

/// `?refresh=true` bypasses the cache freshness check
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    refresh: Option<String>,
}

impl RefreshParams {
    fn forced(&self) -> bool {
        matches!(
            self.refresh.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true") | Some("1") | Some("yes")
        )
    }
}

/// Liveness plus cache ages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub cache: CacheHealth,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub galleries: CacheStatus,
    pub news: CacheStatus,
}

/// Build the API router
pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/galleries", get(list_galleries))
        .route("/api/galleries/:folder_id", get(folder_images))
        .route("/api/folders", get(list_folders))
        .route("/api/news", get(list_news))
        .route("/api/news/:article_id", get(get_article))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn list_galleries(
    State(state): Shared,
    Query(params): Query<RefreshParams>,
) -> Result<impl IntoResponse, ApiError> {
    let galleries = state
        .cached_galleries(params.forced())
        .await
        .map_err(ApiError::with("Failed to fetch galleries"))?;

    let count = galleries.len();
    Ok(Json(ApiResponse::list(galleries, count)))
}

async fn folder_images(
    State(state): Shared,
    Path(folder_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(folder = %folder_id, "Listing images for folder");
    let images = state
        .content
        .list_images(&folder_id)
        .await
        .map_err(ApiError::with("Failed to fetch images"))?;

    let count = images.len();
    Ok(Json(ApiResponse::list(images, count)))
}

async fn list_folders(State(state): Shared) -> Result<impl IntoResponse, ApiError> {
    let folders = state
        .content
        .list_folders()
        .await
        .map_err(ApiError::with("Failed to fetch folders"))?;

    let count = folders.len();
    Ok(Json(ApiResponse::list(folders, count)))
}

async fn list_news(
    State(state): Shared,
    Query(params): Query<RefreshParams>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = state
        .cached_articles(params.forced())
        .await
        .map_err(ApiError::with("Failed to fetch news"))?;

    let count = articles.len();
    Ok(Json(ApiResponse::list(articles, count)))
}

async fn get_article(
    State(state): Shared,
    Path(article_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .content
        .get_article(&article_id)
        .await
        .map_err(ApiError::with("Failed to fetch article"))?;

    Ok(Json(ApiResponse::item(article)))
}

async fn health(State(state): Shared) -> Json<HealthResponse> {
    let now = state.clock.now();
    Json(HealthResponse {
        status: "ok",
        timestamp: now,
        uptime_seconds: now.signed_duration_since(state.started_at).num_seconds(),
        cache: CacheHealth {
            galleries: state.galleries.status(),
            news: state.news.status(),
        },
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Not found", "No route matches this path")),
    )
}
