//! Configuration schema for hoard
//!
//! Configuration is stored at `~/.config/hoard/config.toml`

use crate::cleanup::{AgeBasedEviction, CleanupScheduler, RetentionPeriod};
use crate::error::HoardResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache store settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache store and cleanup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store directory (default: user cache dir)
    pub dir: Option<PathBuf>,

    /// Entries unused for more than N days become eligible for deletion
    pub retention_days: i64,

    /// Minimum days between two cleanup scans of a store
    pub cleanup_interval_days: i64,

    /// Seconds to wait for the store lock
    pub lock_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            retention_days: 7,
            cleanup_interval_days: 7,
            lock_timeout_secs: 60,
        }
    }
}

impl CacheConfig {
    /// Store directory, falling back to the per-user default
    pub fn store_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_store_dir)
    }

    /// Lock acquisition timeout
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Validated retention period
    pub fn retention(&self) -> HoardResult<RetentionPeriod> {
        RetentionPeriod::from_days(self.retention_days)
    }

    /// Eviction strategy for the configured retention period
    pub fn eviction(&self) -> HoardResult<AgeBasedEviction> {
        Ok(AgeBasedEviction::new(self.retention()?))
    }

    /// Scheduler for the configured check interval
    pub fn scheduler(&self) -> HoardResult<CleanupScheduler> {
        CleanupScheduler::from_days(self.cleanup_interval_days)
    }
}

/// Default store directory under the user cache dir
pub fn default_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hoard")
        .join("build-cache")
}
