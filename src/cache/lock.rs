//! Per-key mutual exclusion through an exclusive-create marker file
//!
//! Holding a [`CacheLock`] means `<key>.lock` exists in the cache
//! directory and was created by this holder. Dropping the guard removes
//! the marker, so every exit path of a critical section releases it.

use super::naming::CacheKey;
use crate::diagnostics::Diagnostics;
use crate::error::{BibCacheError, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Default delay between acquisition attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default age after which a marker is treated as abandoned
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(600);

/// How acquisition waits for a contended lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Delay between attempts to create the marker
    pub poll_interval: Duration,
    /// Remove markers older than this (None keeps them forever)
    pub stale_after: Option<Duration>,
    /// Fail with `LockTimeout` after waiting this long (None waits forever)
    pub timeout: Option<Duration>,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_after: Some(DEFAULT_STALE_AFTER),
            timeout: None,
        }
    }
}

/// Held lock on one cache key
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    released: bool,
}

impl CacheLock {
    /// Block until the marker for `key` is created by this caller
    ///
    /// # Arguments
    /// * `cache_dir` - Existing, writable cache directory
    /// * `key` - Cache key whose entries are protected
    /// * `options` - Polling, stale-marker and timeout behaviour
    /// * `diagnostics` - Receives wait and stale-marker messages
    ///
    /// # Returns
    /// The held lock, or an error for any failure other than contention
    pub fn acquire(
        cache_dir: &Path,
        key: &CacheKey,
        options: &LockOptions,
        diagnostics: &Diagnostics,
    ) -> Result<Self> {
        let path = key.lock_path(cache_dir);
        let started = Instant::now();
        let mut reported_wait = false;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    return Ok(Self {
                        path,
                        released: false,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(BibCacheError::LockFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })
                }
            }

            if let Some(stale_after) = options.stale_after {
                if marker_age(&path).map_or(false, |age| age >= stale_after) {
                    diagnostics.warn(&format!(
                        "removing abandoned lock '{}' (older than {}s)",
                        path.display(),
                        stale_after.as_secs()
                    ));
                    remove_marker(&path)?;
                    continue;
                }
            }

            let waited = started.elapsed();
            if let Some(timeout) = options.timeout {
                if waited >= timeout {
                    return Err(BibCacheError::LockTimeout {
                        path: path.display().to_string(),
                        waited_ms: waited.as_millis(),
                    });
                }
            }

            if !reported_wait {
                diagnostics.debug(&format!("waiting for lock {}", path.display()));
                reported_wait = true;
            }
            thread::sleep(options.poll_interval);
        }
    }

    /// Remove the marker, reporting failures that dropping would swallow
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_marker(&self.path)
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = remove_marker(&self.path);
        }
    }
}

/// Remove a marker; an already-absent marker is not an error
fn remove_marker(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BibCacheError::LockFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Time since the marker was last modified, if it can be determined
fn marker_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}
