//! Garbage collection for cache stores
//!
//! Cleanup is requested once, near the end of the root build invocation,
//! for every store that build knows about:
//!
//! 1. [`CleanupGate`] refuses outright unless the build is the root.
//! 2. [`CleanupScheduler`] checks each store at most once per process and
//!    only proceeds when the GC marker is older than the check interval.
//! 3. The store is locked exclusively and a [`CleanupStrategy`] (normally
//!    [`AgeBasedEviction`]) removes stale entries.
//! 4. The GC marker is touched and the lock released.
//!
//! # Per-store states
//!
//! | From | To | When |
//! |------|----|------|
//! | NotChecked | Skipped | interval not elapsed |
//! | NotChecked | Scanning | marker absent or stale |
//! | Scanning | Deleting | at least one entry qualified |
//! | Scanning / Deleting | MarkerTouched | pass completed |

pub mod eviction;
pub mod gate;
pub mod operation;
pub mod scheduler;

pub use eviction::{AgeBasedEviction, EvictionOutcome, RetentionPeriod};
pub use gate::{BuildRole, CleanupGate, GateOutcome, NestedKind, PARENT_BUILD_ENV};
pub use operation::{CleanupOperation, OperationObserver, TracingObserver};
pub use scheduler::{CleanupScheduler, CleanupStatus, DEFAULT_CHECK_INTERVAL};

use crate::error::HoardResult;
use crate::store::CacheStore;
use std::fmt;
use std::time::SystemTime;

/// Progress of a store through one build's cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupState {
    NotChecked,
    Skipped,
    Scanning,
    Deleting,
    MarkerTouched,
}

impl fmt::Display for CleanupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotChecked => write!(f, "not-checked"),
            Self::Skipped => write!(f, "skipped"),
            Self::Scanning => write!(f, "scanning"),
            Self::Deleting => write!(f, "deleting"),
            Self::MarkerTouched => write!(f, "marker-touched"),
        }
    }
}

/// Removes entries from a store already locked exclusively by the caller
pub trait CleanupStrategy {
    /// Run one pass at time `now`
    fn clean(&self, store: &CacheStore, now: SystemTime) -> HoardResult<EvictionOutcome>;
}
