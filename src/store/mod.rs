//! Persistent content-addressed cache store
//!
//! A store is a single directory shared by every process that opens it.
//!
//! # Layout
//!
//! | File | Purpose |
//! |------|---------|
//! | `cache.properties` | Format version, written once at creation |
//! | `cache.lock` | Advisory lock file, never a payload entry |
//! | `gc.properties` | Modification time records the last cleanup attempt |
//! | `<hex-digest>` | Content-addressed payload entries |
//!
//! Entries are immutable. Identical keys imply identical bytes, so an
//! entry is only ever created or deleted, both under the exclusive lock.
//! Writers stage bytes in a temporary file and rename it into place, so no
//! reader sees a partially written entry. Keys are case-insensitive and an
//! entry is found under whatever hex case it was stored with.

pub mod key;
pub mod lock;
pub mod size;

pub use key::{is_key_name, CacheKey, KEY_LENGTH};
pub use lock::{LockMode, StoreLock};
pub use size::format_bytes;

use crate::error::{HoardError, HoardResult};
use chrono::Utc;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Properties file holding the store format version
pub const PROPERTIES_FILE: &str = "cache.properties";
/// Lock file shared by all processes using the store
pub const LOCK_FILE: &str = "cache.lock";
/// Marker whose modification time records the last cleanup attempt
pub const GC_MARKER_FILE: &str = "gc.properties";
/// On-disk format version written to new stores
pub const FORMAT_VERSION: &str = "1";

/// Suffixes reserved for store metadata; never payload entries
pub const RESERVED_SUFFIXES: [&str; 2] = [".properties", ".lock"];

/// Default time to wait for the store lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether a file name is store metadata rather than a payload entry
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// A payload entry as found on disk
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File name, which is the entry's key
    pub key: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// Handle to an opened cache store
#[derive(Debug, Clone)]
pub struct CacheStore {
    base_dir: PathBuf,
    lock_timeout: Duration,
}

impl CacheStore {
    /// Open a store, creating its directory and properties file on first use
    pub fn open(base_dir: impl AsRef<Path>, lock_timeout: Duration) -> HoardResult<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir).map_err(|e| {
            HoardError::io(format!("creating cache directory {}", base_dir.display()), e)
        })?;

        let base_dir = base_dir.canonicalize().map_err(|e| {
            HoardError::io(format!("resolving cache directory {}", base_dir.display()), e)
        })?;

        let store = Self {
            base_dir,
            lock_timeout,
        };
        store.ensure_properties()?;
        Ok(store)
    }

    /// Base directory (canonical)
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Lock acquisition timeout
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Path of the properties file
    pub fn properties_path(&self) -> PathBuf {
        self.base_dir.join(PROPERTIES_FILE)
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(LOCK_FILE)
    }

    /// Path of the GC marker
    pub fn gc_marker_path(&self) -> PathBuf {
        self.base_dir.join(GC_MARKER_FILE)
    }

    /// Path an entry with this key lives at
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir.join(key.as_str())
    }

    /// Acquire the store lock in the given mode
    pub fn lock(&self, mode: LockMode) -> HoardResult<StoreLock> {
        StoreLock::acquire(&self.lock_path(), mode, self.lock_timeout)
    }

    /// Store bytes under `key` unless an entry already exists
    ///
    /// Returns `true` if a new entry was published.
    pub fn put(&self, key: &CacheKey, bytes: &[u8]) -> HoardResult<bool> {
        let _lock = self.lock(LockMode::Exclusive)?;

        if self.locate(key)?.is_some() {
            debug!("Cache entry {} already present", key);
            return Ok(false);
        }
        let target = self.entry_path(key);

        let staging = self
            .base_dir
            .join(format!("{}.partial", uuid::Uuid::new_v4().simple()));

        if let Err(e) = write_then_publish(&staging, &target, bytes) {
            let _ = fs::remove_file(&staging);
            return Err(HoardError::io(format!("writing cache entry {}", key), e));
        }

        debug!("Stored cache entry {} ({} bytes)", key, bytes.len());
        Ok(true)
    }

    /// Read an entry, `None` on a miss
    pub fn get(&self, key: &CacheKey) -> HoardResult<Option<Vec<u8>>> {
        let _lock = self.lock(LockMode::Shared)?;

        let Some(path) = self.locate(key)? else {
            return Ok(None);
        };
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoardError::io(format!("reading cache entry {}", key), e)),
        }
    }

    /// Whether an entry exists for `key`
    pub fn contains(&self, key: &CacheKey) -> HoardResult<bool> {
        let _lock = self.lock(LockMode::Shared)?;
        Ok(self.locate(key)?.is_some_and(|path| path.is_file()))
    }

    /// Remove an entry; returns whether anything was removed
    pub fn invalidate(&self, key: &CacheKey) -> HoardResult<bool> {
        let _lock = self.lock(LockMode::Exclusive)?;

        let Some(path) = self.locate(key)? else {
            return Ok(false);
        };
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Invalidated cache entry {} in {}", key, self);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(HoardError::io(format!("removing cache entry {}", key), e)),
        }
    }

    /// List payload entries (direct children only)
    pub fn entries(&self) -> HoardResult<Vec<CacheEntry>> {
        let _lock = self.lock(LockMode::Shared)?;

        let read_dir = fs::read_dir(&self.base_dir).map_err(|e| {
            HoardError::io(format!("listing {}", self.base_dir.display()), e)
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir.flatten() {
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !is_key_name(&name) {
                continue;
            }
            let Ok(meta) = dir_entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            entries.push(CacheEntry {
                key: name,
                size_bytes: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Path of the entry for `key` as stored, whatever its hex case
    ///
    /// Callers hold the store lock.
    fn locate(&self, key: &CacheKey) -> HoardResult<Option<PathBuf>> {
        let canonical = self.entry_path(key);
        if fs::symlink_metadata(&canonical).is_ok() {
            return Ok(Some(canonical));
        }

        let read_dir = fs::read_dir(&self.base_dir).map_err(|e| {
            HoardError::io(format!("listing {}", self.base_dir.display()), e)
        })?;
        Ok(read_dir.flatten().map(|e| e.path()).find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.eq_ignore_ascii_case(key.as_str()))
        }))
    }

    /// Time of the last cleanup attempt, if any
    pub fn last_cleanup(&self) -> HoardResult<Option<SystemTime>> {
        let marker = self.gc_marker_path();
        match fs::metadata(&marker) {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| HoardError::io(format!("reading mtime of {}", marker.display()), e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoardError::io(format!("reading {}", marker.display()), e)),
        }
    }

    /// Set the GC marker's modification time, creating it if needed
    pub fn touch_gc_marker(&self, at: SystemTime) -> HoardResult<()> {
        let marker = self.gc_marker_path();
        if !marker.exists() {
            fs::write(&marker, "").map_err(|e| {
                HoardError::io(format!("creating GC marker {}", marker.display()), e)
            })?;
        }
        filetime::set_file_mtime(&marker, filetime::FileTime::from_system_time(at))
            .map_err(|e| HoardError::io(format!("touching GC marker {}", marker.display()), e))
    }

    /// Write the properties file once, or verify an existing one
    fn ensure_properties(&self) -> HoardResult<()> {
        let path = self.properties_path();

        if path.exists() {
            return self.verify_properties(&path);
        }

        let _lock = self.lock(LockMode::Exclusive)?;
        // Another process may have created it while we waited
        if path.exists() {
            return self.verify_properties(&path);
        }

        let content = format!(
            "version={}\ncreated={}\n",
            FORMAT_VERSION,
            Utc::now().to_rfc3339()
        );
        let staging = self.base_dir.join(format!("{}.properties.tmp", uuid::Uuid::new_v4().simple()));
        write_then_publish(&staging, &path, content.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&staging);
            HoardError::io(format!("writing {}", path.display()), e)
        })?;

        debug!("Created cache store at {}", self.base_dir.display());
        Ok(())
    }

    fn verify_properties(&self, path: &Path) -> HoardResult<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| HoardError::io(format!("reading {}", path.display()), e))?;

        let version = content
            .lines()
            .filter_map(|line| line.split_once('='))
            .find(|(k, _)| k.trim() == "version")
            .map(|(_, v)| v.trim().to_string());

        match version {
            Some(v) if v != FORMAT_VERSION => Err(HoardError::StoreVersionMismatch {
                store: self.base_dir.clone(),
                found: v,
                expected: FORMAT_VERSION.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Build cache ({})", self.base_dir.display())
    }
}

/// Stage `bytes` in `staging`, sync, then rename onto `target`
fn write_then_publish(staging: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(staging)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(staging, target)
}
