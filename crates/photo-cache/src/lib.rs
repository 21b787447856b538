//! Disk-backed photo cache
//!
//! Stores downloaded photos as files in a dedicated directory and tracks them
//! in an in-memory index keyed by photo id. Downloads are de-duplicated per id,
//! writes are atomic, and the index is rebuilt from the directory on open.
//! Eviction is by age or down to a byte budget, oldest first.

mod cache;
mod clock;
mod error;
mod source;
mod storage;
mod types;

pub use cache::{PhotoCache, PhotoCacheConfig};
pub use clock::{Clock, SystemClock};
pub use error::{PhotoCacheError, Result};
pub use source::{validate_request, PhotoSource};
pub use storage::{file_name_for, photo_id_from_file_name};
pub use types::{
    BatchItem, CacheEntry, CacheStats, DownloadRequest, EvictionReport, PressurePolicy, Provenance,
    DEFAULT_DOWNLOAD_TIMEOUT,
};
