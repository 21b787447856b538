//! On-disk layout of the cache directory
//!
//! Each photo lives at `<dir>/<percent-encoded id>.jpg`. Uppercase ASCII is
//! escaped as well, so names never differ only in case and ids stay distinct
//! on case-insensitive filesystems. Writes land in a hidden `.partial`
//! sibling first and are renamed into place, so the canonical path only ever
//! holds complete files.

use crate::error::{PhotoCacheError, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const PHOTO_EXTENSION: &str = ".jpg";
const PARTIAL_EXTENSION: &str = ".partial";

/// Longest file name most filesystems accept (NAME_MAX)
const MAX_FILE_NAME_LEN: usize = 255;

/// A photo file found while scanning the cache directory
#[derive(Debug, Clone)]
pub(crate) struct ScannedFile {
    pub photo_id: String,
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Deterministic file name for a photo id
pub fn file_name_for(photo_id: &str) -> String {
    let mut name = String::with_capacity(photo_id.len() + PHOTO_EXTENSION.len());
    let mut buf = [0u8; 4];
    for c in photo_id.chars() {
        if c.is_ascii_uppercase() {
            name.push_str(&format!("%{:02X}", c as u8));
        } else {
            name.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    name.push_str(PHOTO_EXTENSION);
    name
}

/// Whether the id's file, and its temporary sibling, fit within NAME_MAX
pub(crate) fn file_name_fits(photo_id: &str) -> bool {
    // `.` + name + `.partial`
    file_name_for(photo_id).len() + 1 + PARTIAL_EXTENSION.len() <= MAX_FILE_NAME_LEN
}

/// Recover the photo id from a file name written by [`file_name_for`]
pub fn photo_id_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(PHOTO_EXTENSION)?;
    if stem.is_empty() {
        return None;
    }
    let photo_id = urlencoding::decode(stem).ok()?.into_owned();

    // Only canonical names round-trip; anything else was not written by us
    (file_name_for(&photo_id) == file_name).then_some(photo_id)
}

fn partial_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}{PARTIAL_EXTENSION}"))
}

/// Write `data` to `path` via a temporary sibling and a rename.
///
/// Returns the size of the file now at `path`. On failure the temporary file
/// is removed and `path` is left untouched.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<u64> {
    let partial = partial_path_for(path);

    let written = async {
        let mut file = fs::File::create(&partial).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&partial, path).await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial).await {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(path = ?partial, error = %cleanup, "Failed to remove partial file");
            }
        }
        return Err(PhotoCacheError::storage(path, e));
    }

    let metadata = fs::metadata(path)
        .await
        .map_err(|e| PhotoCacheError::storage(path, e))?;
    Ok(metadata.len())
}

/// Delete a cached file; a file that is already gone counts as deleted
pub(crate) async fn delete_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = ?path, "File already absent");
            Ok(())
        }
        Err(e) => Err(PhotoCacheError::storage(path, e)),
    }
}

pub(crate) async fn file_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Size of a regular file at `path`, if there is one
pub(crate) async fn existing_file_size(path: &Path) -> Option<u64> {
    match fs::metadata(path).await {
        Ok(m) if m.is_file() => Some(m.len()),
        _ => None,
    }
}

/// Enumerate recognizable photo files and sweep leftovers of interrupted writes
pub(crate) async fn scan_dir(dir: &Path, now: DateTime<Utc>) -> Result<Vec<ScannedFile>> {
    let mut read_dir = fs::read_dir(dir)
        .await
        .map_err(|e| PhotoCacheError::storage(dir, e))?;
    let mut found = Vec::new();

    while let Some(dir_entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| PhotoCacheError::storage(dir, e))?
    {
        let path = dir_entry.path();
        let file_name = dir_entry.file_name().to_string_lossy().into_owned();

        if file_name.ends_with(PARTIAL_EXTENSION) {
            debug!(path = ?path, "Removing stale partial file");
            delete_file(&path).await?;
            continue;
        }

        let Some(photo_id) = photo_id_from_file_name(&file_name) else {
            debug!(path = ?path, "Ignoring unrecognized file in cache dir");
            continue;
        };

        let metadata = match dir_entry.metadata().await {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to stat cached file, skipping");
                continue;
            }
        };

        let created_at = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or(now);

        found.push(ScannedFile {
            photo_id,
            path,
            size: metadata.len(),
            created_at,
        });
    }

    Ok(found)
}
