//! Error types for the Unsplash API client

use std::fmt;

/// Errors that can occur when talking to the Unsplash API
#[derive(Debug)]
pub enum UnsplashError {
    /// No access key was configured
    MissingAccessKey,
    /// HTTP request failed
    Http(reqwest::Error),
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// The access key was rejected (401)
    Unauthorized,
    /// The hourly request quota is used up (403)
    RateLimited,
    /// Any other non-success status
    UnexpectedStatus(u16),
}

impl fmt::Display for UnsplashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccessKey => write!(f, "No Unsplash access key provided"),
            Self::Http(e) => write!(f, "Unsplash HTTP error: {}", e),
            Self::Json(e) => write!(f, "Unsplash JSON parse error: {}", e),
            Self::Unauthorized => write!(f, "Unsplash rejected the access key"),
            Self::RateLimited => write!(f, "Unsplash rate limit exceeded, try again later"),
            Self::UnexpectedStatus(status) => {
                write!(f, "Unsplash returned unexpected status {}", status)
            }
        }
    }
}

impl std::error::Error for UnsplashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UnsplashError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for UnsplashError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for Unsplash API operations
pub type Result<T> = std::result::Result<T, UnsplashError>;
