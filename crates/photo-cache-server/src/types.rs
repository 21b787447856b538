//! Request and response bodies for the photo cache server

use photo_cache::{BatchItem, CacheEntry, CacheStats};
use serde::{Deserialize, Serialize};
use unsplash_client::SearchParams;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Every cached photo, oldest first
#[derive(Debug, Serialize)]
pub struct PhotoListResponse {
    pub total_bytes: u64,
    pub photos: Vec<CacheEntry>,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub photo_id: String,
    pub removed: bool,
}

fn default_random_count() -> u32 {
    5
}

fn default_popular_count() -> u32 {
    10
}

fn default_page() -> u32 {
    1
}

/// Body of `POST /photos/random`
#[derive(Debug, Deserialize)]
pub struct RandomPhotosRequest {
    #[serde(default = "default_random_count")]
    pub count: u32,
    #[serde(flatten)]
    pub params: SearchParams,
}

/// Body of `POST /photos/popular`
#[derive(Debug, Deserialize)]
pub struct PopularPhotosRequest {
    #[serde(default = "default_popular_count")]
    pub count: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

/// Body of `POST /cache/evict`; the configured age limit applies when unset
#[derive(Debug, Default, Deserialize)]
pub struct EvictRequest {
    pub older_than_days: Option<u64>,
}

/// Body of `POST /cache/pressure`; the configured budget applies when unset
#[derive(Debug, Default, Deserialize)]
pub struct PressureRequest {
    pub target_bytes: Option<u64>,
}

/// Outcome for one photo of a batch download
#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub photo_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<CacheEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchItem> for BatchItemResponse {
    fn from(item: BatchItem) -> Self {
        match item.result {
            Ok(entry) => Self {
                photo_id: item.photo_id,
                entry: Some(entry),
                error: None,
            },
            Err(e) => Self {
                photo_id: item.photo_id,
                entry: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub requested: usize,
    pub succeeded: usize,
    pub items: Vec<BatchItemResponse>,
}

impl BatchResponse {
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        let requested = items.len();
        let succeeded = items.iter().filter(|item| item.is_ok()).count();
        Self {
            requested,
            succeeded,
            items: items.into_iter().map(BatchItemResponse::from).collect(),
        }
    }
}
