//! HTTP server for the photo cache
//!
//! Exposes the cache to the presentation layer: listing, lookups, removal,
//! batch downloads from Unsplash, and the eviction entry points the host
//! uses when it is short on resources.

use crate::config::Config;
use crate::error::AppError;
use crate::types::{
    BatchResponse, EvictRequest, HealthResponse, PhotoListResponse, PopularPhotosRequest,
    PressureRequest, RandomPhotosRequest, RemoveResponse,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use photo_cache::{CacheEntry, EvictionReport, PhotoCache, PressurePolicy};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use unsplash_client::{UnsplashClient, UnsplashPhoto};

const DAY_SECS: u64 = 24 * 60 * 60;

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: PhotoCache,
    pub unsplash: UnsplashClient,
    pub download_timeout: Duration,
    pub max_age: Duration,
    pub pressure: PressurePolicy,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: PhotoCache, unsplash: UnsplashClient, config: &Config) -> Self {
        Self {
            cache,
            unsplash,
            download_timeout: config.download_timeout,
            max_age: config.max_age,
            pressure: config.pressure.clone(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

type ApiResult<T> = std::result::Result<Json<T>, AppError>;

/// Build the CORS layer from configured origins; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any)
    }
}

/// Create the HTTP router
pub fn create_router(state: SharedState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/photos", get(list_photos).delete(clear_photos))
        .route("/photos/random", post(download_random))
        .route("/photos/popular", post(download_popular))
        .route("/photos/{id}", get(get_photo).delete(remove_photo))
        .route("/photos/{id}/image", get(get_image))
        .route("/cache/evict", post(evict_expired))
        .route("/cache/pressure", post(relieve_pressure))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server; returns once a shutdown signal has drained it
pub async fn start_server(state: SharedState, cors: CorsLayer, port: u16) -> std::io::Result<()> {
    let router = create_router(state, cors);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

async fn list_photos(State(state): State<SharedState>) -> Json<PhotoListResponse> {
    let photos = state.cache.entries().await;
    let total_bytes = photos.iter().map(|p| p.size).sum();
    Json(PhotoListResponse {
        total_bytes,
        photos,
    })
}

async fn clear_photos(State(state): State<SharedState>) -> ApiResult<EvictionReport> {
    Ok(Json(state.cache.clear_all().await?))
}

async fn get_photo(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<CacheEntry> {
    state
        .cache
        .lookup(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Photo not cached: {id}")))
}

async fn remove_photo(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<RemoveResponse> {
    let removed = state.cache.remove(&id).await?;
    Ok(Json(RemoveResponse {
        photo_id: id,
        removed,
    }))
}

/// Serve cached bytes; never triggers a download
async fn get_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let data = state.cache.read(&id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
            (HeaderName::from_static("x-cache"), "HIT"),
        ],
        data,
    )
        .into_response())
}

async fn download_random(
    State(state): State<SharedState>,
    Json(body): Json<RandomPhotosRequest>,
) -> ApiResult<BatchResponse> {
    let photos = state
        .unsplash
        .random_photos(body.count, &body.params)
        .await?;
    Ok(Json(cache_photos(&state, &photos).await))
}

async fn download_popular(
    State(state): State<SharedState>,
    Json(body): Json<PopularPhotosRequest>,
) -> ApiResult<BatchResponse> {
    let photos = state
        .unsplash
        .photos(body.page, body.count, "popular")
        .await?;
    Ok(Json(cache_photos(&state, &photos).await))
}

async fn cache_photos(state: &ServerState, photos: &[UnsplashPhoto]) -> BatchResponse {
    let requests = photos
        .iter()
        .map(|photo| photo.download_request(state.download_timeout))
        .collect();
    BatchResponse::from_items(state.cache.ensure_cached_many(requests).await)
}

async fn evict_expired(
    State(state): State<SharedState>,
    Json(body): Json<EvictRequest>,
) -> ApiResult<EvictionReport> {
    let max_age = body
        .older_than_days
        .map(|days| Duration::from_secs(days.saturating_mul(DAY_SECS)))
        .unwrap_or(state.max_age);
    Ok(Json(state.cache.evict_older_than(max_age).await?))
}

/// Entry point for the host's memory-pressure signal
async fn relieve_pressure(
    State(state): State<SharedState>,
    Json(body): Json<PressureRequest>,
) -> ApiResult<EvictionReport> {
    let mut policy = state.pressure.clone();
    if let Some(target_bytes) = body.target_bytes {
        policy.target_bytes = target_bytes;
    }

    info!(target_bytes = policy.target_bytes, "Relieving cache pressure");
    Ok(Json(state.cache.relieve_pressure(&policy).await?))
}
