//! Rust client for the Unsplash photo API
//!
//! Lists and samples photos from Unsplash and turns them into download
//! requests for the `photo-cache` crate. [`HttpPhotoSource`] is the HTTP
//! implementation of the cache's download source.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use photo_cache::{PhotoCache, PhotoCacheConfig};
//! use unsplash_client::{HttpPhotoSource, SearchParams, UnsplashClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UnsplashClient::new("my-access-key")?;
//! let cache = PhotoCache::open(
//!     PhotoCacheConfig::new("./cache/photos"),
//!     Arc::new(HttpPhotoSource::new()),
//! )
//! .await?;
//!
//! let photos = client.random_photos(5, &SearchParams::default()).await?;
//! let requests = photos
//!     .iter()
//!     .map(|p| p.download_request(Duration::from_secs(30)))
//!     .collect();
//! for item in cache.ensure_cached_many(requests).await {
//!     println!("{}: {}", item.photo_id, item.is_ok());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - `GET /photos/random` - One or many random photos, with filters
//! - `GET /photos` - Editorial feed, paged

mod client;
mod error;
mod source;
mod types;

pub use client::{UnsplashClient, MAX_PAGE_SIZE};
pub use error::{Result, UnsplashError};
pub use source::HttpPhotoSource;
pub use types::{
    Category, Orientation, ProfileImage, SearchParams, UnsplashLinks, UnsplashPhoto, UnsplashUrls,
    UnsplashUser, UserLinks,
};
