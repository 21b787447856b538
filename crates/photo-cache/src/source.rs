//! Download source seam
//!
//! The cache never speaks HTTP itself. It hands a validated
//! [`DownloadRequest`] to a [`PhotoSource`] and stores whatever bytes come back.

use crate::error::{PhotoCacheError, Result};
use crate::storage;
use crate::types::DownloadRequest;
use async_trait::async_trait;
use url::Url;

/// Capability to fetch the bytes behind a download request
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetch the full body for `request`.
    ///
    /// Implementations report unusable descriptors as
    /// [`PhotoCacheError::InvalidSource`] and network problems as
    /// [`PhotoCacheError::TransferFailure`].
    async fn fetch(&self, request: &DownloadRequest) -> Result<Vec<u8>>;
}

/// Reject requests that can never produce bytes, before any transfer starts
pub fn validate_request(request: &DownloadRequest) -> Result<Url> {
    if request.photo_id.trim().is_empty() {
        return Err(PhotoCacheError::InvalidSource(
            "photo id must not be empty".to_string(),
        ));
    }

    if !storage::file_name_fits(&request.photo_id) {
        return Err(PhotoCacheError::InvalidSource(format!(
            "photo id too long to store ({} bytes)",
            request.photo_id.len()
        )));
    }

    let url = Url::parse(&request.url).map_err(|e| {
        PhotoCacheError::InvalidSource(format!("malformed URL {:?}: {}", request.url, e))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(PhotoCacheError::InvalidSource(format!(
                "unsupported scheme: {other}"
            )))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(PhotoCacheError::InvalidSource(format!(
            "URL has no host: {}",
            request.url
        )));
    }

    Ok(url)
}
