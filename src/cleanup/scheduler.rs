//! Time-gated cleanup scheduling
//!
//! Scanning a store is expensive, so a pass only runs when the store's GC
//! marker is missing or older than the check interval. Each store is
//! considered at most once per scheduler, and a scheduler lives for one
//! build process.

use super::{CleanupState, CleanupStrategy, EvictionOutcome};
use crate::error::{HoardError, HoardResult};
use crate::store::{CacheStore, LockMode};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info_span};

/// Default minimum time between two scans of the same store
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// What happened to a store when cleanup was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStatus {
    /// Already considered earlier in this process
    AlreadyChecked,
    /// Interval not yet elapsed; nothing scanned
    Skipped,
    /// A pass ran and the marker was touched
    Cleaned(EvictionOutcome),
}

/// Decides, once per store per process, whether a cleanup pass is due
#[derive(Debug)]
pub struct CleanupScheduler {
    interval: Duration,
    force: bool,
    checked: HashSet<PathBuf>,
}

impl CleanupScheduler {
    /// Create a scheduler with the given check interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            force: false,
            checked: HashSet::new(),
        }
    }

    /// Create a scheduler from an interval in days (at least one)
    pub fn from_days(days: i64) -> HoardResult<Self> {
        if days < 1 {
            return Err(HoardError::InvalidInterval { days });
        }
        let secs = u64::try_from(days)
            .ok()
            .and_then(|d| d.checked_mul(24 * 60 * 60))
            .ok_or(HoardError::InvalidInterval { days })?;
        Ok(Self::new(Duration::from_secs(secs)))
    }

    /// Treat every store as due, regardless of its marker
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Check interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether `store` was already considered by this scheduler
    pub fn was_checked(&self, store: &CacheStore) -> bool {
        self.checked.contains(store.base_dir())
    }

    /// Whether a pass is due for `store` at `now`
    ///
    /// Only stats the GC marker.
    pub fn is_due(&self, store: &CacheStore, now: SystemTime) -> HoardResult<bool> {
        if self.force {
            return Ok(true);
        }
        match store.last_cleanup()? {
            None => Ok(true),
            // A marker from the future (clock skew) is treated as fresh
            Some(last) => Ok(now
                .duration_since(last)
                .map(|elapsed| elapsed >= self.interval)
                .unwrap_or(false)),
        }
    }

    /// Run `strategy` on `store` if this is the first check and one is due
    ///
    /// The store is locked exclusively for the pass and the GC marker is set
    /// to `now` afterwards, whether or not anything was removed. The due
    /// check is repeated once the lock is held.
    pub fn maybe_cleanup(
        &mut self,
        store: &CacheStore,
        now: SystemTime,
        strategy: &dyn CleanupStrategy,
    ) -> HoardResult<CleanupStatus> {
        if !self.checked.insert(store.base_dir().to_path_buf()) {
            return Ok(CleanupStatus::AlreadyChecked);
        }

        if !self.is_due(store, now)? {
            debug!("{}: {} -> {}", store, CleanupState::NotChecked, CleanupState::Skipped);
            return Ok(CleanupStatus::Skipped);
        }

        let span = info_span!("cache_cleanup", store = %store.base_dir().display());
        let _entered = span.enter();

        let _lock = store.lock(LockMode::Exclusive)?;
        // Another process may have finished a pass while we waited
        if !self.is_due(store, now)? {
            debug!("{}: {} -> {}", store, CleanupState::NotChecked, CleanupState::Skipped);
            return Ok(CleanupStatus::Skipped);
        }
        debug!("{}: {} -> {}", store, CleanupState::NotChecked, CleanupState::Scanning);

        let outcome = strategy.clean(store, now)?;

        store.touch_gc_marker(now)?;
        debug!("{}: {}", store, CleanupState::MarkerTouched);

        Ok(CleanupStatus::Cleaned(outcome))
    }
}

impl Default for CleanupScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_INTERVAL)
    }
}
