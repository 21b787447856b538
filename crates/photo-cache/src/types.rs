//! Cache types

use crate::error::PhotoCacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on a single download
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a cached photo came from, as supplied by the caller.
///
/// Entries rebuilt from the cache directory after a restart only know their
/// id, so their provenance is `Unknown` rather than a made-up placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Provenance {
    Recorded(serde_json::Value),
    Unknown,
}

impl Provenance {
    pub fn is_known(&self) -> bool {
        matches!(self, Provenance::Recorded(_))
    }
}

/// Metadata for a cached photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub photo_id: String,
    pub provenance: Provenance,
    pub path: PathBuf,
    pub cached_at: DateTime<Utc>,
    pub size: u64,
}

/// Describes how to fetch a photo that is not cached yet
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub photo_id: String,
    pub url: String,
    pub provenance: serde_json::Value,
    pub timeout: Duration,
}

impl DownloadRequest {
    pub fn new(photo_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            photo_id: photo_id.into(),
            url: url.into(),
            provenance: serde_json::Value::Null,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_provenance(mut self, provenance: serde_json::Value) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub transfers: u64,
}

/// Outcome of a bulk eviction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvictionReport {
    pub removed: Vec<String>,
    pub freed_bytes: u64,
}

impl EvictionReport {
    pub(crate) fn record(&mut self, entry: &CacheEntry) {
        self.removed.push(entry.photo_id.clone());
        self.freed_bytes += entry.size;
    }

    pub(crate) fn merge(&mut self, other: EvictionReport) {
        self.removed.extend(other.removed);
        self.freed_bytes += other.freed_bytes;
    }
}

/// Eviction applied when the host reports resource pressure
#[derive(Debug, Clone)]
pub struct PressurePolicy {
    /// Entries older than this are dropped first
    pub max_age: Duration,
    /// Byte budget the cache is trimmed down to afterwards
    pub target_bytes: u64,
}

impl Default for PressurePolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60), // 1 day
            target_bytes: 50 * 1024 * 1024,             // 50 MB
        }
    }
}

/// Per-id result of a batch download
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub photo_id: String,
    pub result: Result<CacheEntry, PhotoCacheError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
