//! Build-role policy for cleanup
//!
//! Builds nested inside another build share its cache directories. Only
//! the outermost (root) build may clean them; a nested build cleaning on
//! its own could race the enclosing build's decision or remove entries
//! that build is still producing.

use super::{CleanupScheduler, CleanupStatus, CleanupStrategy};
use crate::store::CacheStore;
use std::fmt;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Environment variable an enclosing build sets for the builds it spawns
pub const PARENT_BUILD_ENV: &str = "HOARD_PARENT_BUILD";

/// Kind of nested build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedKind {
    /// A build started by a task of another build
    BuildWithinBuild,
    /// A build included into a composite build
    IncludedBuild,
    /// A project's own build-logic build
    BuildLogic,
}

/// Position of this build in the invocation hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRole {
    Root,
    Nested(NestedKind),
}

impl BuildRole {
    /// Decide the role once, at the top of the process
    ///
    /// An explicit role wins. Otherwise the presence of the parent-build
    /// marker (see [`PARENT_BUILD_ENV`]) means this build was spawned by
    /// another one.
    pub fn detect(explicit: Option<BuildRole>, parent_marker: Option<&str>) -> Self {
        if let Some(role) = explicit {
            return role;
        }
        match parent_marker {
            Some(value) if !value.is_empty() => Self::Nested(NestedKind::BuildWithinBuild),
            _ => Self::Root,
        }
    }

    /// Whether this role may request cleanup
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl fmt::Display for BuildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Nested(NestedKind::BuildWithinBuild) => write!(f, "nested"),
            Self::Nested(NestedKind::IncludedBuild) => write!(f, "included"),
            Self::Nested(NestedKind::BuildLogic) => write!(f, "build-logic"),
        }
    }
}

/// Result of requesting cleanup for one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// This build may not clean up
    Disabled,
    /// The scheduler considered the store
    Checked(CleanupStatus),
    /// The store could not be cleaned this time (lock timeout, I/O error)
    Failed(String),
}

/// Authorizes cleanup for the root build only
#[derive(Debug, Clone, Copy)]
pub struct CleanupGate {
    role: BuildRole,
}

impl CleanupGate {
    pub fn new(role: BuildRole) -> Self {
        Self { role }
    }

    pub fn role(&self) -> BuildRole {
        self.role
    }

    /// End-of-build maintenance over every store this build knows about
    ///
    /// Stores are handled independently; one that fails is reported and
    /// the rest are still considered.
    pub fn run(
        &self,
        scheduler: &mut CleanupScheduler,
        stores: &[CacheStore],
        now: SystemTime,
        strategy: &dyn CleanupStrategy,
    ) -> Vec<GateOutcome> {
        if !self.role.is_root() {
            debug!("Cache cleanup disabled for {} build", self.role);
            return vec![GateOutcome::Disabled; stores.len()];
        }

        stores
            .iter()
            .map(|store| match scheduler.maybe_cleanup(store, now, strategy) {
                Ok(status) => GateOutcome::Checked(status),
                Err(e) => {
                    warn!("Skipping cleanup of {}: {}", store, e);
                    GateOutcome::Failed(e.to_string())
                }
            })
            .collect()
    }
}
