//! Disk-backed photo cache with in-memory metadata
//!
//! The index of cached photos and the table of in-flight downloads share one
//! async mutex. A download for a given photo id runs at most once at a time:
//! later callers clone the pending [`Shared`] future and receive the same
//! result, and the transfer itself runs on a spawned task so it finishes even
//! when every caller has gone away.

use crate::clock::{Clock, SystemClock};
use crate::error::{PhotoCacheError, Result};
use crate::source::{validate_request, PhotoSource};
use crate::storage;
use crate::types::{
    BatchItem, CacheEntry, CacheStats, DownloadRequest, EvictionReport, PressurePolicy, Provenance,
};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type Transfer = Shared<BoxFuture<'static, Result<CacheEntry>>>;

/// Settings for [`PhotoCache::open`]
#[derive(Clone)]
pub struct PhotoCacheConfig {
    /// Directory dedicated to cached photo files
    pub cache_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
}

impl PhotoCacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Default)]
struct Index {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, Transfer>,
    total_size: u64,
}

impl Index {
    fn insert(&mut self, entry: CacheEntry) {
        self.total_size += entry.size;
        if let Some(previous) = self.entries.insert(entry.photo_id.clone(), entry) {
            self.total_size -= previous.size;
        }
    }

    fn remove(&mut self, photo_id: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(photo_id)?;
        self.total_size -= entry.size;
        Some(entry)
    }

    /// Entries ordered oldest first; ties fall back to the photo id
    fn oldest_first(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.cached_at
                .cmp(&b.cached_at)
                .then_with(|| a.photo_id.cmp(&b.photo_id))
        });
        entries
    }

    /// Delete the file, then drop the entry. A failed delete keeps the entry.
    async fn evict(&mut self, entry: &CacheEntry) -> Result<()> {
        storage::delete_file(&entry.path).await?;
        self.remove(&entry.photo_id);
        Ok(())
    }
}

struct Inner {
    cache_dir: PathBuf,
    source: Arc<dyn PhotoSource>,
    clock: Arc<dyn Clock>,
    index: Mutex<Index>,
    hits: AtomicU64,
    misses: AtomicU64,
    transfers: AtomicU64,
}

impl Inner {
    fn path_for(&self, photo_id: &str) -> PathBuf {
        self.cache_dir.join(storage::file_name_for(photo_id))
    }

    /// Produce the file for `request`, fetching only when nothing usable is on disk
    async fn download(&self, request: &DownloadRequest) -> Result<CacheEntry> {
        let path = self.path_for(&request.photo_id);
        let provenance = Provenance::Recorded(request.provenance.clone());

        if let Some(size) = storage::existing_file_size(&path).await {
            debug!(photo_id = %request.photo_id, size, "Adopting file already on disk");
            return Ok(CacheEntry {
                photo_id: request.photo_id.clone(),
                provenance,
                path,
                cached_at: self.clock.now(),
                size,
            });
        }

        self.transfers.fetch_add(1, Ordering::Relaxed);
        debug!(photo_id = %request.photo_id, url = %request.url, "Downloading photo");

        let data = tokio::time::timeout(request.timeout, self.source.fetch(request)).await??;
        if data.is_empty() {
            return Err(PhotoCacheError::TransferFailure(
                "no data received from server".to_string(),
            ));
        }

        let size = storage::write_atomic(&path, &data).await?;
        debug!(photo_id = %request.photo_id, size, "Stored photo");

        Ok(CacheEntry {
            photo_id: request.photo_id.clone(),
            provenance,
            path,
            cached_at: self.clock.now(),
            size,
        })
    }
}

/// Local store of downloaded photos keyed by photo id.
///
/// Cloning is cheap; clones share the same index and directory.
#[derive(Clone)]
pub struct PhotoCache {
    inner: Arc<Inner>,
}

impl PhotoCache {
    /// Open the cache, creating its directory and rebuilding the index from
    /// the files already in it.
    pub async fn open(config: PhotoCacheConfig, source: Arc<dyn PhotoSource>) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)
            .await
            .map_err(|e| PhotoCacheError::storage(&config.cache_dir, e))?;

        let mut index = Index::default();
        for file in storage::scan_dir(&config.cache_dir, config.clock.now()).await? {
            index.insert(CacheEntry {
                photo_id: file.photo_id,
                provenance: Provenance::Unknown,
                path: file.path,
                cached_at: file.created_at,
                size: file.size,
            });
        }

        info!(
            cache_dir = ?config.cache_dir,
            entries = index.entries.len(),
            total_size = index.total_size,
            "Photo cache opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                cache_dir: config.cache_dir,
                source,
                clock: config.clock,
                index: Mutex::new(index),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                transfers: AtomicU64::new(0),
            }),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    /// Return the cached entry for `request.photo_id`, downloading it first if needed.
    ///
    /// Concurrent calls for the same id share one transfer and all observe its
    /// outcome. Failures are not remembered; the next call tries again.
    pub async fn ensure_cached(&self, request: DownloadRequest) -> Result<CacheEntry> {
        validate_request(&request)?;

        let transfer = {
            let mut index = self.inner.index.lock().await;

            if let Some(entry) = index.entries.get(&request.photo_id).cloned() {
                if storage::file_exists(&entry.path).await {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(photo_id = %request.photo_id, "Cache hit");
                    return Ok(entry);
                }
                warn!(photo_id = %request.photo_id, "Cached file disappeared, fetching again");
                index.remove(&request.photo_id);
            }

            self.inner.misses.fetch_add(1, Ordering::Relaxed);

            match index.in_flight.get(&request.photo_id).cloned() {
                Some(transfer) => {
                    debug!(photo_id = %request.photo_id, "Joining in-flight download");
                    transfer
                }
                None => {
                    let photo_id = request.photo_id.clone();
                    let transfer = self.start_transfer(request);
                    index.in_flight.insert(photo_id, transfer.clone());
                    transfer
                }
            }
        };

        transfer.await
    }

    /// Spawn the download and wrap its handle so it can be awaited by many callers.
    ///
    /// Must be called with the index lock held; the task completes by taking
    /// the same lock to publish its result and retire the in-flight slot.
    fn start_transfer(&self, request: DownloadRequest) -> Transfer {
        let photo_id = request.photo_id.clone();
        let task_inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let result = task_inner.download(&request).await;

            let mut index = task_inner.index.lock().await;
            index.in_flight.remove(&request.photo_id);
            match &result {
                Ok(entry) => index.insert(entry.clone()),
                Err(e) => warn!(photo_id = %request.photo_id, error = %e, "Download failed"),
            }
            result
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_error) => {
                    inner.index.lock().await.in_flight.remove(&photo_id);
                    Err(PhotoCacheError::TransferFailure(format!(
                        "download task for {photo_id} aborted: {join_error}"
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Download every request concurrently, reporting each outcome separately.
    ///
    /// Items come back in request order.
    pub async fn ensure_cached_many(&self, requests: Vec<DownloadRequest>) -> Vec<BatchItem> {
        let requested = requests.len();
        let items: Vec<BatchItem> = join_all(requests.into_iter().map(|request| async move {
            let photo_id = request.photo_id.clone();
            let result = self.ensure_cached(request).await;
            BatchItem { photo_id, result }
        }))
        .await;

        let succeeded = items.iter().filter(|item| item.is_ok()).count();
        info!(
            requested,
            succeeded,
            failed = requested - succeeded,
            "Batch download finished"
        );
        items
    }

    /// Metadata for a cached photo, from the in-memory index only
    pub async fn lookup(&self, photo_id: &str) -> Option<CacheEntry> {
        self.inner.index.lock().await.entries.get(photo_id).cloned()
    }

    pub async fn contains(&self, photo_id: &str) -> bool {
        self.inner.index.lock().await.entries.contains_key(photo_id)
    }

    /// All live entries, oldest first (ties ordered by photo id)
    pub async fn entries(&self) -> Vec<CacheEntry> {
        self.inner.index.lock().await.oldest_first()
    }

    pub async fn len(&self) -> usize {
        self.inner.index.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Sum of the sizes of all live entries
    pub async fn total_bytes(&self) -> u64 {
        self.inner.index.lock().await.total_size
    }

    /// Read the bytes of a cached photo
    pub async fn read(&self, photo_id: &str) -> Result<Vec<u8>> {
        let entry = self
            .lookup(photo_id)
            .await
            .ok_or_else(|| PhotoCacheError::NotFound(photo_id.to_string()))?;

        match fs::read(&entry.path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(photo_id, "Cached file disappeared, dropping entry");
                let mut index = self.inner.index.lock().await;
                // Only drop the entry we read; a fresh download may have replaced it
                if index.entries.get(photo_id) == Some(&entry) {
                    index.remove(photo_id);
                }
                Err(PhotoCacheError::NotFound(photo_id.to_string()))
            }
            Err(e) => Err(PhotoCacheError::storage(&entry.path, e)),
        }
    }

    /// Delete a photo and its file. Returns whether an entry existed.
    pub async fn remove(&self, photo_id: &str) -> Result<bool> {
        let mut index = self.inner.index.lock().await;
        let Some(entry) = index.entries.get(photo_id).cloned() else {
            return Ok(false);
        };

        index.evict(&entry).await?;
        info!(photo_id, size = entry.size, "Removed cached photo");
        Ok(true)
    }

    /// Remove every entry and its file
    pub async fn clear_all(&self) -> Result<EvictionReport> {
        let mut index = self.inner.index.lock().await;
        let mut report = EvictionReport::default();

        for entry in index.oldest_first() {
            index.evict(&entry).await?;
            report.record(&entry);
        }

        info!(
            removed = report.removed.len(),
            freed_bytes = report.freed_bytes,
            "Cleared photo cache"
        );
        Ok(report)
    }

    /// Remove entries cached more than `max_age` ago
    pub async fn evict_older_than(&self, max_age: Duration) -> Result<EvictionReport> {
        let now = self.inner.clock.now();
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        else {
            return Ok(EvictionReport::default());
        };

        let mut index = self.inner.index.lock().await;
        let mut report = EvictionReport::default();

        for entry in index.oldest_first() {
            if entry.cached_at >= cutoff {
                break;
            }
            index.evict(&entry).await?;
            report.record(&entry);
        }

        if !report.removed.is_empty() {
            info!(
                removed = report.removed.len(),
                freed_bytes = report.freed_bytes,
                max_age_secs = max_age.as_secs(),
                "Evicted expired photos"
            );
        }
        Ok(report)
    }

    /// Remove the oldest entries until at most `target_bytes` remain cached
    pub async fn evict_under_pressure(&self, target_bytes: u64) -> Result<EvictionReport> {
        let mut index = self.inner.index.lock().await;
        let mut report = EvictionReport::default();

        if index.total_size <= target_bytes {
            return Ok(report);
        }

        for entry in index.oldest_first() {
            if index.total_size <= target_bytes {
                break;
            }
            index.evict(&entry).await?;
            report.record(&entry);
        }

        info!(
            removed = report.removed.len(),
            freed_bytes = report.freed_bytes,
            target_bytes,
            total_size = index.total_size,
            "Evicted photos under pressure"
        );
        Ok(report)
    }

    /// Response to a host resource-pressure signal: drop stale photos, then
    /// trim to the policy's byte budget.
    pub async fn relieve_pressure(&self, policy: &PressurePolicy) -> Result<EvictionReport> {
        let mut report = self.evict_older_than(policy.max_age).await?;
        report.merge(self.evict_under_pressure(policy.target_bytes).await?);
        Ok(report)
    }

    pub async fn stats(&self) -> CacheStats {
        let index = self.inner.index.lock().await;
        CacheStats {
            entries: index.entries.len(),
            total_size: index.total_size,
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            transfers: self.inner.transfers.load(Ordering::Relaxed),
        }
    }

    /// Let in-flight downloads settle, then release this handle
    pub async fn close(self) {
        let pending: Vec<Transfer> = {
            let index = self.inner.index.lock().await;
            index.in_flight.values().cloned().collect()
        };

        if !pending.is_empty() {
            debug!(pending = pending.len(), "Waiting for in-flight downloads");
            join_all(pending).await;
        }
        info!(cache_dir = ?self.inner.cache_dir, "Photo cache closed");
    }
}
