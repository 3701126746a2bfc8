//! Configuration types for bibcache

use crate::cache::LockOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Default directory holding cache entries
pub const DEFAULT_CACHE_DIR: &str = ".bibcache";

/// Rendering applied to each bibliography record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// `Author (Year) Title`
    #[default]
    Default,
    /// One JSON object per record
    Json,
    /// Citation key only
    Key,
}

impl RecordFormat {
    /// Subcache name used when none is given explicitly
    pub fn subcache_name(self) -> &'static str {
        match self {
            RecordFormat::Default => "default",
            RecordFormat::Json => "json",
            RecordFormat::Key => "key",
        }
    }
}

/// What the binary does with the listed sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Read fresh entries, refresh stale ones
    #[default]
    Read,
    /// Refresh every source unconditionally
    Refresh,
    /// Only report whether every source is fresh
    Check,
}

/// Configuration options for bibcache
#[derive(Debug, Clone)]
pub struct Config {
    /// Bibliography sources, processed in order
    pub sources: Vec<PathBuf>,

    /// Directory holding cache entries (default: .bibcache)
    pub cache_dir: PathBuf,

    /// Subcache namespace for the rendered entries
    pub subcache: String,

    /// Record rendering
    pub format: RecordFormat,

    pub mode: Mode,

    /// Forward debug diagnostics to stderr
    pub verbose: bool,

    // === Locking ===
    /// Delay between attempts to create the lock marker
    pub lock_poll_interval: Duration,

    /// Age after which a lock marker is treated as abandoned (None = never)
    pub stale_lock_after: Option<Duration>,

    /// Give up waiting for a lock after this long (None = wait forever)
    pub lock_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        let lock = LockOptions::default();
        Self {
            sources: Vec::new(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            subcache: RecordFormat::Default.subcache_name().to_string(),
            format: RecordFormat::Default,
            mode: Mode::Read,
            verbose: false,
            lock_poll_interval: lock.poll_interval,
            stale_lock_after: lock.stale_after,
            lock_timeout: lock.timeout,
        }
    }
}

impl Config {
    /// Lock behaviour derived from the locking settings
    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            poll_interval: self.lock_poll_interval,
            stale_after: self.stale_lock_after,
            timeout: self.lock_timeout,
        }
    }
}
