//! HTTP download source for the photo cache

use async_trait::async_trait;
use photo_cache::{DownloadRequest, PhotoCacheError, PhotoSource};
use tracing::{debug, warn};

/// Fetches photo bytes over plain HTTP(S) GET
pub struct HttpPhotoSource {
    client: reqwest::Client,
}

impl HttpPhotoSource {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpPhotoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(err: reqwest::Error) -> PhotoCacheError {
    if err.is_builder() {
        PhotoCacheError::InvalidSource(err.to_string())
    } else {
        PhotoCacheError::TransferFailure(err.to_string())
    }
}

#[async_trait]
impl PhotoSource for HttpPhotoSource {
    async fn fetch(&self, request: &DownloadRequest) -> photo_cache::Result<Vec<u8>> {
        debug!(photo_id = %request.photo_id, url = %request.url, "Fetching photo");

        let response = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %request.url, "Failed to fetch photo");
            return Err(PhotoCacheError::TransferFailure(format!(
                "image host returned status {}",
                response.status()
            )));
        }

        let data = response.bytes().await.map_err(classify)?.to_vec();
        debug!(photo_id = %request.photo_id, size = data.len(), "Fetched photo");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use photo_cache::{PhotoCache, PhotoCacheConfig};
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn spawn_images() -> String {
        let router = Router::new()
            .route("/img/ok", get(|| async { vec![0xFFu8, 0xD8, 0xFF, 0xE0] }))
            .route("/img/missing", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let base = spawn_images().await;
        let source = HttpPhotoSource::new();

        let data = source
            .fetch(&DownloadRequest::new("ok", format!("{base}/img/ok")))
            .await
            .unwrap();
        assert_eq!(data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn test_error_status_is_transfer_failure() {
        let base = spawn_images().await;
        let source = HttpPhotoSource::new();

        let err = source
            .fetch(&DownloadRequest::new("missing", format!("{base}/img/missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoCacheError::TransferFailure(msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transfer_failure() {
        let source = HttpPhotoSource::new();
        let err = source
            .fetch(&DownloadRequest::new("x", "http://127.0.0.1:9/img"))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoCacheError::TransferFailure(_)));
    }

    #[tokio::test]
    async fn test_cache_stores_fetched_photo() {
        let base = spawn_images().await;
        let dir = tempdir().unwrap();
        let cache = PhotoCache::open(
            PhotoCacheConfig::new(dir.path()),
            Arc::new(HttpPhotoSource::new()),
        )
        .await
        .unwrap();

        let entry = cache
            .ensure_cached(DownloadRequest::new("ok", format!("{base}/img/ok")))
            .await
            .unwrap();
        assert_eq!(entry.size, 4);
        assert_eq!(cache.read("ok").await.unwrap().len(), 4);

        let err = cache
            .ensure_cached(DownloadRequest::new("missing", format!("{base}/img/missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoCacheError::TransferFailure(_)));
        assert!(cache.lookup("missing").await.is_none());
    }
}
