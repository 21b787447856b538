//! Photo Cache Server - disk-backed cache of Unsplash photos
//!
//! Downloads photos from Unsplash into a local directory and serves them
//! back to the presentation layer, evicting by age or under pressure.

mod config;
mod error;
mod server;
mod types;

use crate::config::Config;
use crate::error::Result;
use crate::server::{cors_layer, start_server, ServerState, SharedState};
use photo_cache::{PhotoCache, PhotoCacheConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use unsplash_client::{HttpPhotoSource, UnsplashClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("photo_cache_server=info".parse()?)
        .add_directive("photo_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Photo Cache Server...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Download timeout: {:?}", config.download_timeout);
    info!(
        "Pressure budget: {} MB",
        config.pressure.target_bytes / (1024 * 1024)
    );
    if config.unsplash_access_key.is_empty() {
        tracing::warn!("UNSPLASH_ACCESS_KEY is not set; batch downloads will fail");
    }

    let unsplash =
        UnsplashClient::with_base_url(&config.unsplash_base_url, &config.unsplash_access_key)?;
    let cache = PhotoCache::open(
        PhotoCacheConfig::new(config.cache_dir.clone()),
        Arc::new(HttpPhotoSource::new()),
    )
    .await?;
    info!(
        "Recovered {} cached photos ({} bytes)",
        cache.len().await,
        cache.total_bytes().await
    );

    let state: SharedState = Arc::new(ServerState::new(cache.clone(), unsplash, &config));

    // Serves until SIGINT/SIGTERM
    start_server(state, cors_layer(&config.cors_origins), config.port).await?;

    cache.close().await;
    info!("Server shut down gracefully");
    Ok(())
}
