//! Cache entry lifecycle: freshness, refresh and read
//!
//! Every operation on a source runs while holding the lock for that
//! source's key; the lock is dropped on error paths and released
//! explicitly otherwise. Refresh writes the data file completely before the
//! timestamp file, so a fresh timestamp never pairs with partial data.

use super::lock::{CacheLock, LockOptions};
use super::naming::{cache_name, validate_subcache, CacheKey};
use crate::bibtex::{Record, SourceParser};
use crate::diagnostics::Diagnostics;
use crate::error::{BibCacheError, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Disk cache of formatted bibliography listings
pub struct BibCache<P> {
    /// Existing directory holding data, timestamp and lock files
    cache_dir: PathBuf,
    /// Produces the text stored for a source
    parser: P,
    lock_options: LockOptions,
    diagnostics: Diagnostics,
}

impl<P: SourceParser> BibCache<P> {
    /// Create a cache over an existing directory
    ///
    /// The directory is not created; operations fail if it is missing.
    pub fn new(cache_dir: impl Into<PathBuf>, parser: P) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            parser,
            lock_options: LockOptions::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_lock_options(mut self, lock_options: LockOptions) -> Self {
        self.lock_options = lock_options;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[cfg(test)]
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// True only if every source is fresh; stops at the first stale one
    pub fn is_fresh_all<S: AsRef<Path>>(&self, subcache: &str, sources: &[S]) -> Result<bool> {
        for source in sources {
            if !self.is_fresh(source.as_ref(), subcache)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Refresh every source in order, feeding `sink` while doing so
    pub fn refresh_and_do<S: AsRef<Path>>(
        &self,
        sources: &[S],
        subcache: &str,
        formatter: &dyn Fn(&Record) -> String,
        mut sink: impl FnMut(&str),
    ) -> Result<()> {
        for source in sources {
            self.refresh(source.as_ref(), subcache, formatter, &mut sink)?;
        }
        Ok(())
    }

    /// Feed `sink` from the cache for fresh sources and refresh stale ones
    ///
    /// Decided per source: one stale file does not force its siblings to
    /// be refreshed.
    pub fn read_and_do<S: AsRef<Path>>(
        &self,
        sources: &[S],
        subcache: &str,
        formatter: &dyn Fn(&Record) -> String,
        mut sink: impl FnMut(&str),
    ) -> Result<()> {
        validate_subcache(subcache)?;
        for source in sources {
            let source = source.as_ref();
            let key = cache_name(source)?;
            let lock = self.lock(&key)?;
            if self.check_fresh(&key, source, subcache)? {
                self.read_entry(&key, subcache, &mut sink)?;
            } else {
                self.write_entry(&key, source, subcache, formatter, &mut sink)?;
            }
            lock.release()?;
        }
        Ok(())
    }

    /// Whether the cached copy of `source` is at least as new as the source
    pub fn is_fresh(&self, source: &Path, subcache: &str) -> Result<bool> {
        validate_subcache(subcache)?;
        let key = cache_name(source)?;
        let lock = self.lock(&key)?;
        let fresh = self.check_fresh(&key, source, subcache)?;
        lock.release()?;
        Ok(fresh)
    }

    /// Re-parse `source`, store the result and stream it to `sink`
    pub fn refresh(
        &self,
        source: &Path,
        subcache: &str,
        formatter: &dyn Fn(&Record) -> String,
        sink: &mut dyn FnMut(&str),
    ) -> Result<()> {
        validate_subcache(subcache)?;
        let key = cache_name(source)?;
        let lock = self.lock(&key)?;
        self.write_entry(&key, source, subcache, formatter, sink)?;
        lock.release()
    }

    /// Stream the cached lines of `source` to `sink`
    ///
    /// The data file must exist; call after a freshness check.
    pub fn read(&self, source: &Path, subcache: &str, sink: &mut dyn FnMut(&str)) -> Result<()> {
        validate_subcache(subcache)?;
        let key = cache_name(source)?;
        let lock = self.lock(&key)?;
        self.read_entry(&key, subcache, sink)?;
        lock.release()
    }

    fn lock(&self, key: &CacheKey) -> Result<CacheLock> {
        CacheLock::acquire(&self.cache_dir, key, &self.lock_options, &self.diagnostics)
    }

    // The helpers below expect the caller to hold the lock for `key`.

    fn check_fresh(&self, key: &CacheKey, source: &Path, subcache: &str) -> Result<bool> {
        self.diagnostics
            .debug(&format!("{} -> {}", source.display(), key));
        let timestamp_path = key.timestamp_path(&self.cache_dir, subcache);
        let content = match fs::read_to_string(&timestamp_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.diagnostics.debug(&format!(
                    "cache does not exist yet: {}",
                    timestamp_path.display()
                ));
                return Ok(false);
            }
            Err(e) => {
                return Err(BibCacheError::CacheRead {
                    path: timestamp_path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let stored = match parse_timestamp(&content) {
            Some(stored) => stored,
            None => {
                self.diagnostics.warn(&format!(
                    "ignoring malformed timestamp in '{}'",
                    timestamp_path.display()
                ));
                0
            }
        };

        let modified = modified_nanos(source)?;
        if stored < modified {
            self.diagnostics
                .debug(&format!("cache is out of date for: {}", source.display()));
            return Ok(false);
        }

        let data_path = key.data_path(&self.cache_dir, subcache);
        if !data_path.is_file() {
            self.diagnostics.debug(&format!(
                "cache data missing despite timestamp: {}",
                data_path.display()
            ));
            return Ok(false);
        }

        self.diagnostics
            .debug(&format!("cache is up to date for: {}", source.display()));
        Ok(true)
    }

    fn write_entry(
        &self,
        key: &CacheKey,
        source: &Path,
        subcache: &str,
        formatter: &dyn Fn(&Record) -> String,
        sink: &mut dyn FnMut(&str),
    ) -> Result<()> {
        let data = self.parser.parse(source, formatter, sink)?;

        let data_path = key.data_path(&self.cache_dir, subcache);
        self.diagnostics
            .debug(&format!("writing {}", data_path.display()));
        write_file(&data_path, data.as_bytes())?;

        let timestamp_path = key.timestamp_path(&self.cache_dir, subcache);
        write_file(&timestamp_path, now_nanos().to_string().as_bytes())
    }

    fn read_entry(&self, key: &CacheKey, subcache: &str, sink: &mut dyn FnMut(&str)) -> Result<()> {
        let data_path = key.data_path(&self.cache_dir, subcache);
        self.diagnostics
            .debug(&format!("opening: {}", data_path.display()));
        let read_error = |e: std::io::Error| BibCacheError::CacheRead {
            path: data_path.display().to_string(),
            reason: e.to_string(),
        };

        let file = File::open(&data_path).map_err(read_error)?;
        for line in BufReader::new(file).lines() {
            sink(&line.map_err(read_error)?);
        }
        Ok(())
    }
}

/// First line of a timestamp file as nanoseconds since the epoch
fn parse_timestamp(content: &str) -> Option<u128> {
    content.lines().next()?.trim().parse().ok()
}

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
}

/// Modification time of `source` in nanoseconds since the epoch
fn modified_nanos(source: &Path) -> Result<u128> {
    let modified = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| BibCacheError::SourceUnavailable {
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos()))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| BibCacheError::CacheWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
