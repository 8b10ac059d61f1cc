//! Age-based eviction
//!
//! Entries whose modification time is older than the retention period are
//! removed. Only the direct children of the store directory are
//! considered; subdirectories are not descended into, and which on-disk
//! layouts count as valid depends on that.

use super::operation::{CleanupOperation, OperationObserver, TracingObserver};
use super::{CleanupState, CleanupStrategy};
use crate::error::{HoardError, HoardResult};
use crate::store::{format_bytes, is_reserved_name, CacheStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Minimum time an unused entry survives before it may be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPeriod {
    days: u32,
}

impl RetentionPeriod {
    /// Validate a retention period given in days (at least one)
    pub fn from_days(days: i64) -> HoardResult<Self> {
        if days < 1 {
            return Err(HoardError::InvalidRetention { days });
        }
        let days = u32::try_from(days).map_err(|_| HoardError::InvalidRetention { days })?;
        Ok(Self { days })
    }

    /// Number of days
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Period as a duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.days) * SECONDS_PER_DAY)
    }

    /// Oldest modification time an entry may have and still be kept
    pub fn oldest_timestamp_to_keep(&self, now: SystemTime) -> SystemTime {
        now.checked_sub(self.as_duration())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

/// Result of one eviction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionOutcome {
    /// Entries selected for deletion
    pub candidates: usize,
    /// Entries actually removed
    pub removed: usize,
    /// Bytes freed by the removed entries
    pub reclaimed_bytes: u64,
}

/// Whether a file name may ever be selected for deletion
pub fn can_be_deleted(name: &str) -> bool {
    !is_reserved_name(name)
}

/// Select direct children of `dir` last modified strictly before `oldest_to_keep`
pub fn find_entries_to_delete(dir: &Path, oldest_to_keep: SystemTime) -> HoardResult<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| HoardError::io(format!("scanning {}", dir.display()), e))?;

    let mut selected = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if !can_be_deleted(&dir_entry.file_name().to_string_lossy()) {
            continue;
        }

        // An entry removed since listing simply is not a candidate
        let modified = match dir_entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };

        if modified < oldest_to_keep {
            selected.push(dir_entry.path());
        }
    }

    Ok(selected)
}

/// Delete each path independently, returning (removed, reclaimed bytes)
///
/// Failures are logged and skipped; one entry never stops the rest.
pub fn delete_entries(paths: &[PathBuf]) -> (usize, u64) {
    let mut removed = 0;
    let mut reclaimed = 0u64;

    for path in paths {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                debug!("Could not clean up cache entry {}: {}", path.display(), e);
                continue;
            }
        };

        // Directories are removed only when empty; their contents are
        // outside the scanned level.
        let result = if meta.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        let size = if meta.is_dir() { 0 } else { meta.len() };

        match result {
            Ok(()) => {
                removed += 1;
                reclaimed += size;
            }
            Err(e) => debug!("Could not clean up cache entry {}: {}", path.display(), e),
        }
    }

    (removed, reclaimed)
}

/// Removes entries unused for longer than the retention period
#[derive(Clone)]
pub struct AgeBasedEviction {
    retention: RetentionPeriod,
    observer: Arc<dyn OperationObserver>,
}

impl AgeBasedEviction {
    /// Create a strategy that reports operations to the tracing log
    pub fn new(retention: RetentionPeriod) -> Self {
        Self {
            retention,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Report operations to `observer` instead
    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Configured retention period
    pub fn retention(&self) -> RetentionPeriod {
        self.retention
    }

    fn observed<T>(&self, operation: CleanupOperation, f: impl FnOnce() -> T) -> T {
        self.observer.started(&operation);
        let result = f();
        self.observer.finished(&operation);
        result
    }
}

impl std::fmt::Debug for AgeBasedEviction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgeBasedEviction")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl CleanupStrategy for AgeBasedEviction {
    fn clean(&self, store: &CacheStore, now: SystemTime) -> HoardResult<EvictionOutcome> {
        let threshold = self.retention.oldest_timestamp_to_keep(now);

        let candidates = self.observed(
            CleanupOperation::Scan {
                directory: store.base_dir().to_path_buf(),
            },
            || find_entries_to_delete(store.base_dir(), threshold),
        )?;

        let mut outcome = EvictionOutcome {
            candidates: candidates.len(),
            ..EvictionOutcome::default()
        };

        if !candidates.is_empty() {
            debug!("{}: {}", store, CleanupState::Deleting);
            let (removed, reclaimed) = self.observed(
                CleanupOperation::Delete {
                    store: store.to_string(),
                },
                || delete_entries(&candidates),
            );
            outcome.removed = removed;
            outcome.reclaimed_bytes = reclaimed;
        }

        info!(
            "{} removing {} cache entries ({} reclaimed).",
            store,
            outcome.removed,
            format_bytes(outcome.reclaimed_bytes)
        );

        Ok(outcome)
    }
}
