//! Data types for Unsplash API responses
//!
//! These structs mirror the API's JSON. Optional fields are the ones Unsplash
//! omits or nulls for some photos.

use photo_cache::DownloadRequest;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A photo from `/photos` or `/photos/random`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub blur_hash: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by_user: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    pub user: UnsplashUser,
    pub urls: UnsplashUrls,
    #[serde(default)]
    pub links: Option<UnsplashLinks>,
}

impl UnsplashPhoto {
    /// Fields kept alongside the cached file
    pub fn provenance(&self) -> serde_json::Value {
        serde_json::json!({
            "description": self.description,
            "alt_description": self.alt_description,
            "author": self.user.name,
            "username": self.user.username,
            "width": self.width,
            "height": self.height,
            "color": self.color,
            "likes": self.likes,
        })
    }

    /// Cache request for the `regular` rendition of this photo
    pub fn download_request(&self, timeout: Duration) -> DownloadRequest {
        DownloadRequest::new(self.id.clone(), self.urls.regular.clone())
            .with_provenance(self.provenance())
            .with_timeout(timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashUser {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_likes: Option<u64>,
    #[serde(default)]
    pub total_photos: Option<u64>,
    #[serde(default)]
    pub total_collections: Option<u64>,
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
    #[serde(default)]
    pub links: Option<UserLinks>,
}

/// Renditions of a photo, largest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashUrls {
    pub raw: String,
    pub full: String,
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub html: String,
    pub download: String,
    pub download_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImage {
    pub small: String,
    pub medium: String,
    pub large: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub html: String,
    pub photos: String,
    pub likes: String,
    #[serde(default)]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Squarish,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Squarish => "squarish",
        }
    }
}

/// Unsplash topics usable as a category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Nature,
    People,
    Technology,
    Animals,
    Food,
    Travel,
    Architecture,
    Business,
    Fashion,
    Film,
    Health,
    Interiors,
    Street,
    Experimental,
    Textures,
    CurrentEvents,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::People => "people",
            Self::Technology => "technology",
            Self::Animals => "animals",
            Self::Food => "food",
            Self::Travel => "travel",
            Self::Architecture => "architecture",
            Self::Business => "business",
            Self::Fashion => "fashion",
            Self::Film => "film",
            Self::Health => "health",
            Self::Interiors => "interiors",
            Self::Street => "street",
            Self::Experimental => "experimental",
            Self::Textures => "textures",
            Self::CurrentEvents => "current-events",
        }
    }
}

/// Filters for `/photos/random`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
}

impl SearchParams {
    /// Query-string pairs for the set filters, values not yet encoded
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("query", query.to_string()));
        }
        if let Some(orientation) = self.orientation {
            pairs.push(("orientation", orientation.as_str().to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("topics", category.as_str().to_string()));
        }
        if let Some(featured) = self.featured {
            pairs.push(("featured", featured.to_string()));
        }
        if let Some(username) = self.username.as_deref() {
            pairs.push(("username", username.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTO_JSON: &str = r##"{
        "id": "Dwu85P9SOIk",
        "created_at": "2016-05-03T11:00:28-04:00",
        "updated_at": "2016-07-10T11:00:01-05:00",
        "width": 2448,
        "height": 3264,
        "color": "#6E633A",
        "blur_hash": "LFC$yHwc8^$yIAS$%M%00KxukYIp",
        "likes": 24,
        "liked_by_user": false,
        "description": "A man drinking a coffee.",
        "alt_description": null,
        "user": {
            "id": "QPxL2MGqfrw",
            "username": "exampleuser",
            "name": "Joe Example",
            "portfolio_url": null,
            "profile_image": {
                "small": "https://images.unsplash.com/face-small",
                "medium": "https://images.unsplash.com/face-medium",
                "large": "https://images.unsplash.com/face-large"
            }
        },
        "urls": {
            "raw": "https://images.unsplash.com/photo-1?ixid=raw",
            "full": "https://images.unsplash.com/photo-1?q=75&fm=jpg",
            "regular": "https://images.unsplash.com/photo-1?q=75&fm=jpg&w=1080&fit=max",
            "small": "https://images.unsplash.com/photo-1?q=75&fm=jpg&w=400&fit=max",
            "thumb": "https://images.unsplash.com/photo-1?q=75&fm=jpg&w=200&fit=max"
        },
        "links": {
            "self": "https://api.unsplash.com/photos/Dwu85P9SOIk",
            "html": "https://unsplash.com/photos/Dwu85P9SOIk",
            "download": "https://unsplash.com/photos/Dwu85P9SOIk/download",
            "download_location": "https://api.unsplash.com/photos/Dwu85P9SOIk/download"
        }
    }"##;

    #[test]
    fn test_photo_deserialization() {
        let photo: UnsplashPhoto = serde_json::from_str(PHOTO_JSON).unwrap();
        assert_eq!(photo.id, "Dwu85P9SOIk");
        assert_eq!(photo.width, 2448);
        assert_eq!(photo.user.name, "Joe Example");
        assert!(photo.alt_description.is_none());
        assert_eq!(
            photo.links.unwrap().self_link,
            "https://api.unsplash.com/photos/Dwu85P9SOIk"
        );
    }

    #[test]
    fn test_download_request_uses_regular_rendition() {
        let photo: UnsplashPhoto = serde_json::from_str(PHOTO_JSON).unwrap();
        let request = photo.download_request(Duration::from_secs(10));

        assert_eq!(request.photo_id, "Dwu85P9SOIk");
        assert_eq!(request.url, photo.urls.regular);
        assert_eq!(request.timeout, Duration::from_secs(10));
        assert_eq!(request.provenance["author"], "Joe Example");
        assert_eq!(request.provenance["width"], 2448);
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&Category::CurrentEvents).unwrap();
        assert_eq!(json, "\"current-events\"");
        let parsed: Category = serde_json::from_str("\"nature\"").unwrap();
        assert_eq!(parsed, Category::Nature);
    }

    #[test]
    fn test_query_pairs_skip_unset_filters() {
        let params = SearchParams {
            query: Some(String::new()),
            orientation: Some(Orientation::Squarish),
            category: Some(Category::CurrentEvents),
            ..Default::default()
        };

        assert_eq!(
            params.query_pairs(),
            vec![
                ("orientation", "squarish".to_string()),
                ("topics", "current-events".to_string()),
            ]
        );
        assert!(SearchParams::default().query_pairs().is_empty());
    }
}
