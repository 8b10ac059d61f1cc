//! Observability hooks for cleanup passes
//!
//! A pass reports at most two operations: a scan of the store directory
//! and, when anything qualified, the deletion of the selected entries.
//! The eviction algorithm only calls the hooks; what they record is up to
//! the observer.

use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Operation reported by a cleanup pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOperation {
    /// Listing the store directory for candidates
    Scan {
        /// Directory being scanned
        directory: PathBuf,
    },
    /// Deleting the selected entries
    Delete {
        /// Display name of the store
        store: String,
    },
}

impl CleanupOperation {
    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::Scan { directory } => format!("Scan {}", directory.display()),
            Self::Delete { store } => format!("Delete files for {}", store),
        }
    }
}

impl fmt::Display for CleanupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Receives start/finish notifications for cleanup operations
pub trait OperationObserver: Send + Sync {
    /// Called before the operation runs
    fn started(&self, operation: &CleanupOperation);

    /// Called after the operation completes
    fn finished(&self, operation: &CleanupOperation);
}

/// Observer that writes operations to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl OperationObserver for TracingObserver {
    fn started(&self, operation: &CleanupOperation) {
        debug!("Starting: {}", operation);
    }

    fn finished(&self, operation: &CleanupOperation) {
        debug!("Finished: {}", operation);
    }
}
