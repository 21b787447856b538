//! Unsplash API HTTP client

use crate::error::{Result, UnsplashError};
use crate::types::{SearchParams, UnsplashPhoto};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest page the API hands out for listings and random batches
pub const MAX_PAGE_SIZE: u32 = 30;

/// Client for the Unsplash photo API
///
/// Authenticates every request with the `Client-ID` scheme.
pub struct UnsplashClient {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl UnsplashClient {
    /// Base URL for the public API
    pub const DEFAULT_BASE_URL: &'static str = "https://api.unsplash.com";

    /// Create a client for the public API (30 second timeout)
    pub fn new(access_key: &str) -> Result<Self> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, access_key)
    }

    /// Create a client against a custom API root
    pub fn with_base_url(base_url: &str, access_key: &str) -> Result<Self> {
        Self::with_timeout(base_url, access_key, Duration::from_secs(30))
    }

    /// Create a client with a custom API root and request timeout
    pub fn with_timeout(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
        })
    }

    /// Fetch a single random photo matching `params`
    pub async fn random_photo(&self, params: &SearchParams) -> Result<UnsplashPhoto> {
        let url = self.random_url(params, None);
        self.get_json(&url).await
    }

    /// Fetch up to `count` random photos matching `params` (clamped to 1..=30)
    pub async fn random_photos(
        &self,
        count: u32,
        params: &SearchParams,
    ) -> Result<Vec<UnsplashPhoto>> {
        let url = self.random_url(params, Some(count.clamp(1, MAX_PAGE_SIZE)));
        self.get_json(&url).await
    }

    /// List photos from the editorial feed
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `per_page` - Photos per page (clamped to 1..=30)
    /// * `order_by` - `latest`, `oldest` or `popular`
    pub async fn photos(
        &self,
        page: u32,
        per_page: u32,
        order_by: &str,
    ) -> Result<Vec<UnsplashPhoto>> {
        let url = format!(
            "{}/photos?page={}&per_page={}&order_by={}",
            self.base_url,
            page.max(1),
            per_page.clamp(1, MAX_PAGE_SIZE),
            urlencoding::encode(order_by)
        );
        self.get_json(&url).await
    }

    fn random_url(&self, params: &SearchParams, count: Option<u32>) -> String {
        let mut pairs = params.query_pairs();
        if let Some(count) = count {
            pairs.push(("count", count.to_string()));
        }

        let mut url = format!("{}/photos/random", self.base_url);
        for (i, (key, value)) in pairs.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        if self.access_key.is_empty() {
            return Err(UnsplashError::MissingAccessKey);
        }

        debug!(url = %url, "Requesting Unsplash API");

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept", "application/json")
            .header("Accept-Version", "v1")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(UnsplashError::Unauthorized),
            StatusCode::FORBIDDEN => return Err(UnsplashError::RateLimited),
            status => {
                warn!(status = %status, url = %url, "Unsplash request failed");
                return Err(UnsplashError::UnexpectedStatus(status.as_u16()));
            }
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Orientation};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn photo_json(id: &str) -> Value {
        json!({
            "id": id,
            "width": 640,
            "height": 480,
            "color": "#000000",
            "likes": 3,
            "liked_by_user": false,
            "description": null,
            "user": { "id": "u1", "username": "ann", "name": "Ann" },
            "urls": {
                "raw": format!("https://images.example.com/{id}?raw"),
                "full": format!("https://images.example.com/{id}?full"),
                "regular": format!("https://images.example.com/{id}?regular"),
                "small": format!("https://images.example.com/{id}?small"),
                "thumb": format!("https://images.example.com/{id}?thumb")
            }
        })
    }

    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_random_url_encodes_filters() {
        let client = UnsplashClient::with_base_url("https://api.example.com/", "key").unwrap();
        let params = SearchParams {
            query: Some("red fox".to_string()),
            orientation: Some(Orientation::Landscape),
            category: Some(Category::Animals),
            ..Default::default()
        };

        assert_eq!(
            client.random_url(&params, Some(5)),
            "https://api.example.com/photos/random?query=red%20fox&orientation=landscape&topics=animals&count=5"
        );
        assert_eq!(
            client.random_url(&SearchParams::default(), None),
            "https://api.example.com/photos/random"
        );
    }

    #[tokio::test]
    async fn test_missing_access_key_fails_before_request() {
        let client = UnsplashClient::with_base_url("http://127.0.0.1:9", "").unwrap();
        let err = client.random_photo(&SearchParams::default()).await.unwrap_err();
        assert!(matches!(err, UnsplashError::MissingAccessKey));
    }

    #[tokio::test]
    async fn test_random_photos_sends_client_id() {
        let router = Router::new().route(
            "/photos/random",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth != "Client-ID secret" {
                    return Err(AxumStatus::UNAUTHORIZED);
                }
                Ok(Json(json!([photo_json("a"), photo_json("b")])))
            }),
        );
        let base = spawn_api(router).await;

        let client = UnsplashClient::with_base_url(&base, "secret").unwrap();
        let photos = client
            .random_photos(2, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[1].id, "b");

        let wrong_key = UnsplashClient::with_base_url(&base, "wrong").unwrap();
        let err = wrong_key
            .random_photos(2, &SearchParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UnsplashError::Unauthorized));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new()
            .route("/photos/random", get(|| async { AxumStatus::FORBIDDEN }))
            .route("/photos", get(|| async { AxumStatus::SERVICE_UNAVAILABLE }));
        let base = spawn_api(router).await;
        let client = UnsplashClient::with_base_url(&base, "key").unwrap();

        let err = client.random_photo(&SearchParams::default()).await.unwrap_err();
        assert!(matches!(err, UnsplashError::RateLimited));

        let err = client.photos(1, 10, "popular").await.unwrap_err();
        assert!(matches!(err, UnsplashError::UnexpectedStatus(503)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let router = Router::new().route("/photos", get(|| async { "not json" }));
        let base = spawn_api(router).await;
        let client = UnsplashClient::with_base_url(&base, "key").unwrap();

        let err = client.photos(1, 10, "latest").await.unwrap_err();
        assert!(matches!(err, UnsplashError::Json(_)));
    }
}
