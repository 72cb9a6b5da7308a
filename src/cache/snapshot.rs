//! Date-stamped snapshots of measurement collections
//!
//! Provides a `SnapshotStore` that writes one JSON file per category per day.
//! A snapshot is fresh only on the day it was captured; older files stay on
//! disk but no longer match today's file names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{Category, Measurement};

/// Default snapshot directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "cache/medicoes";

/// Extension of snapshot files
const SNAPSHOT_EXT: &str = "json";

/// Errors that can occur when reading a snapshot
#[derive(Debug, Error)]
pub enum CacheReadError {
    /// File missing or unreadable
    #[error("cannot read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File contents are not a snapshot
    #[error("corrupt snapshot {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot header names a different category than its file name
    #[error("snapshot {} holds {found} measurements, expected {expected}", .path.display())]
    CategoryMismatch {
        path: PathBuf,
        expected: Category,
        found: Category,
    },

    /// Snapshot header names a different day than its file name
    #[error("snapshot {} was captured on {found}, expected {expected}", .path.display())]
    DateMismatch {
        path: PathBuf,
        expected: NaiveDate,
        found: NaiveDate,
    },
}

/// Errors that can occur when writing a snapshot
#[derive(Debug, Error)]
pub enum CacheWriteError {
    /// Directory creation, write or rename failed
    #[error("cannot write snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk layout of one snapshot
#[derive(Debug, Serialize)]
struct SnapshotFile<'a> {
    category: Category,
    captured_on: NaiveDate,
    saved_at: DateTime<Utc>,
    measurements: &'a [Measurement],
}

#[derive(Debug, Deserialize)]
struct OwnedSnapshotFile {
    category: Category,
    captured_on: NaiveDate,
    measurements: Vec<Measurement>,
}

/// Reads and writes per-category, per-day measurement snapshots
///
/// Files are named `<YYYY-MM-DD> - <category>.json` inside `cache_dir`, e.g.
/// `cache/medicoes/2020-03-01 - mortos.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::with_dir(DEFAULT_CACHE_DIR)
    }
}

impl SnapshotStore {
    /// Creates a store rooted at `cache_dir`
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the snapshot for a category captured on `date`
    pub fn snapshot_path(&self, category: Category, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(format!(
            "{} - {}.{}",
            date.format("%Y-%m-%d"),
            category.file_name(),
            SNAPSHOT_EXT
        ))
    }

    /// True if every category has a snapshot captured on `date`
    ///
    /// Each category is checked on its own; one fresh file never vouches for
    /// the others.
    pub fn has_fresh_snapshot(&self, date: NaiveDate) -> bool {
        Category::ALL
            .iter()
            .all(|&category| self.snapshot_path(category, date).is_file())
    }

    /// Reads the snapshot of `category` captured on `date`
    ///
    /// # Returns
    /// * `Ok(Vec<Measurement>)` with the measurements in the order they were saved
    /// * `Err(CacheReadError)` if the file is missing, corrupt, or its header
    ///   doesn't match the requested category and date
    pub fn load(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> Result<Vec<Measurement>, CacheReadError> {
        let path = self.snapshot_path(category, date);
        let content = fs::read_to_string(&path).map_err(|source| CacheReadError::Io {
            path: path.clone(),
            source,
        })?;
        let snapshot: OwnedSnapshotFile =
            serde_json::from_str(&content).map_err(|source| CacheReadError::Decode {
                path: path.clone(),
                source,
            })?;

        if snapshot.category != category {
            return Err(CacheReadError::CategoryMismatch {
                path,
                expected: category,
                found: snapshot.category,
            });
        }
        if snapshot.captured_on != date {
            return Err(CacheReadError::DateMismatch {
                path,
                expected: date,
                found: snapshot.captured_on,
            });
        }
        if let Some(stray) = snapshot
            .measurements
            .iter()
            .find(|m| m.category() != category)
        {
            return Err(CacheReadError::CategoryMismatch {
                path,
                expected: category,
                found: stray.category(),
            });
        }

        Ok(snapshot.measurements)
    }

    /// Writes the snapshot of `category` for `date`, replacing any existing one
    ///
    /// Creates the cache directory if needed. The data is written to a
    /// temporary file first and renamed into place, so readers never see a
    /// half-written snapshot. If the write fails, any earlier snapshot of
    /// `category` for `date` is removed so the category counts as not cached.
    pub fn save(
        &self,
        category: Category,
        date: NaiveDate,
        measurements: &[Measurement],
    ) -> Result<PathBuf, CacheWriteError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheWriteError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;

        let snapshot = SnapshotFile {
            category,
            captured_on: date,
            saved_at: Utc::now(),
            measurements,
        };
        let json = serde_json::to_vec(&snapshot)?;

        let path = self.snapshot_path(category, date);
        let tmp_path = path.with_extension(format!("{SNAPSHOT_EXT}.tmp"));
        let written = fs::write(&tmp_path, json)
            .map_err(|source| CacheWriteError::Io {
                path: tmp_path.clone(),
                source,
            })
            .and_then(|()| {
                fs::rename(&tmp_path, &path).map_err(|source| CacheWriteError::Io {
                    path: path.clone(),
                    source,
                })
            });

        if let Err(e) = written {
            discard(&tmp_path);
            discard(&path);
            return Err(e);
        }
        Ok(path)
    }

    /// Days for which all three categories have a snapshot, newest first
    pub fn snapshot_dates(&self) -> io::Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(date) = name
                .to_str()
                .and_then(|name| name.split(" - ").next())
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            else {
                continue;
            };
            if !dates.contains(&date) && self.has_fresh_snapshot(date) {
                dates.push(date);
            }
        }

        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }
}

/// Best-effort removal of a file left behind by a failed save
fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed stale snapshot file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove snapshot file"),
    }
}
