//! Error types for the photo cache server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photo_cache::PhotoCacheError;
use serde_json::json;
use std::fmt;
use unsplash_client::UnsplashError;

/// Errors that stop the server from starting
#[derive(Debug)]
pub enum ServerError {
    Cache(PhotoCacheError),
    Unsplash(UnsplashError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Cache(err) => write!(f, "Cache error: {}", err),
            ServerError::Unsplash(err) => write!(f, "Unsplash client error: {}", err),
            ServerError::Io(err) => write!(f, "IO error: {}", err),
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Cache(err) => Some(err),
            ServerError::Unsplash(err) => Some(err),
            ServerError::Io(err) => Some(err.as_ref()),
            ServerError::Config(_) => None,
        }
    }
}

impl From<PhotoCacheError> for ServerError {
    fn from(err: PhotoCacheError) -> Self {
        ServerError::Cache(err)
    }
}

impl From<UnsplashError> for ServerError {
    fn from(err: UnsplashError) -> Self {
        ServerError::Unsplash(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Request error type that converts to HTTP responses
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// The photo provider or image host failed
    Upstream(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream error");
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<PhotoCacheError> for AppError {
    fn from(err: PhotoCacheError) -> Self {
        match err {
            PhotoCacheError::NotFound(_) => AppError::NotFound(err.to_string()),
            PhotoCacheError::InvalidSource(_) => AppError::BadRequest(err.to_string()),
            PhotoCacheError::TransferFailure(_) => AppError::Upstream(err.to_string()),
            PhotoCacheError::StorageFailure { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<UnsplashError> for AppError {
    fn from(err: UnsplashError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ServerError::Config("missing CACHE_DIR".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing CACHE_DIR");
    }

    #[test]
    fn test_io_error_converts() {
        let err: ServerError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(matches!(err, ServerError::Io(_)));
        assert_eq!(format!("{}", err), "IO error: port taken");
    }

    #[test]
    fn test_cache_error_display() {
        let err = ServerError::from(PhotoCacheError::NotFound("abc".to_string()));
        assert!(format!("{}", err).contains("abc"));
    }

    #[test]
    fn test_cache_errors_map_to_statuses() {
        let cases = [
            (PhotoCacheError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (PhotoCacheError::InvalidSource("b".into()), StatusCode::BAD_REQUEST),
            (PhotoCacheError::TransferFailure("c".into()), StatusCode::BAD_GATEWAY),
            (
                PhotoCacheError::storage("/x", std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_unsplash_error_is_bad_gateway() {
        let response = AppError::from(UnsplashError::RateLimited).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
