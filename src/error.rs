//! Error types for hoard
//!
//! All modules use `HoardResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for hoard operations
pub type HoardResult<T> = Result<T, HoardError>;

/// All errors that can occur in hoard
#[derive(Error, Debug)]
pub enum HoardError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid retention period of {days} day(s): cache entries must be retained for at least a day")]
    InvalidRetention { days: i64 },

    #[error("Invalid cleanup interval of {days} day(s): the interval must be at least a day")]
    InvalidInterval { days: i64 },

    // Store errors
    #[error("Cache store {store} unavailable: lock not acquired within {waited:?}")]
    StoreUnavailable { store: PathBuf, waited: Duration },

    #[error("Cache store {store} has format version {found}, expected {expected}")]
    StoreVersionMismatch {
        store: PathBuf,
        found: String,
        expected: String,
    },

    #[error("Invalid cache key '{0}': expected 32 hexadecimal characters")]
    InvalidKey(String),

    #[error("Cache entry not found: {0}")]
    EntryNotFound(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl HoardError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error is a build-configuration failure
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. } | Self::InvalidRetention { .. } | Self::InvalidInterval { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRetention { .. } => Some("Set cache.retention_days to 1 or more"),
            Self::InvalidInterval { .. } => Some("Set cache.cleanup_interval_days to 1 or more"),
            Self::StoreUnavailable { .. } => {
                Some("Another process holds the cache lock; retry once it finishes")
            }
            Self::StoreVersionMismatch { .. } => {
                Some("Point cache.dir at a new directory or remove the old store")
            }
            _ => None,
        }
    }
}
