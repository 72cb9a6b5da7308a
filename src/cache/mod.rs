//! Cache module for storing measurement snapshots on disk
//!
//! Each category's collection is persisted once per calendar day. A snapshot
//! is only trusted on the day it was captured; from the next day on the
//! loader fetches again and writes a new set of files.

mod snapshot;

pub use snapshot::{CacheReadError, CacheWriteError, SnapshotStore, DEFAULT_CACHE_DIR};
