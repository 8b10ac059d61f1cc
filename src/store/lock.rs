//! Cross-process locking for cache stores
//!
//! Every process touching a store takes an advisory lock on its
//! `cache.lock` file. Readers share; anything that creates or removes an
//! entry holds the lock exclusively for the whole mutation.
//!
//! Acquisition polls non-blocking attempts until the configured timeout.
//! A store whose lock cannot be obtained in time is reported as
//! unavailable; retrying is left to the caller.

use crate::error::{HoardError, HoardResult};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const CONTENTION_WARNING_AFTER: Duration = Duration::from_millis(500);

/// Lock mode requested on a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Concurrent readers
    Shared,
    /// Single writer or deleter
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Held lock on a store; released on drop
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl StoreLock {
    /// Acquire `lock_path` in `mode`, waiting at most `timeout`
    pub fn acquire(lock_path: &Path, mode: LockMode, timeout: Duration) -> HoardResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| HoardError::io(format!("opening lock {}", lock_path.display()), e))?;

        let start = Instant::now();
        let mut warned = false;

        loop {
            match try_lock(&file, mode) {
                Ok(()) => {
                    if warned {
                        debug!(
                            "Acquired {} lock on {} after {:.1}s",
                            mode,
                            lock_path.display(),
                            start.elapsed().as_secs_f64()
                        );
                    }
                    return Ok(Self {
                        file,
                        path: lock_path.to_path_buf(),
                        mode,
                    });
                }
                Err(e) if is_contended(&e) => {
                    if !warned && start.elapsed() >= CONTENTION_WARNING_AFTER {
                        warn!(
                            "Waiting for {} lock on {} held by another process",
                            mode,
                            lock_path.display()
                        );
                        warned = true;
                    }
                }
                Err(e) => {
                    return Err(HoardError::io(
                        format!("locking {}", lock_path.display()),
                        e,
                    ))
                }
            }

            if start.elapsed() >= timeout {
                let store = lock_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| lock_path.to_path_buf());
                return Err(HoardError::StoreUnavailable {
                    store,
                    waited: timeout,
                });
            }

            std::thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed())));
        }
    }

    /// Lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode this lock was acquired in
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well; unlocking first keeps
        // the release independent of when the handle is actually closed.
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            debug!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

// Called through the trait path so newer std inherent `File` lock methods
// are not picked up instead.
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
    match mode {
        LockMode::Shared => fs2::FileExt::try_lock_shared(file),
        LockMode::Exclusive => fs2::FileExt::try_lock_exclusive(file),
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
