//! CLI argument parsing using clap

use crate::cache::validate_subcache;
use crate::config::{Config, Mode, RecordFormat, DEFAULT_CACHE_DIR};
use crate::error::{BibCacheError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// List bibliography records through an on-disk cache
#[derive(Parser, Debug)]
#[command(name = "bibcache")]
#[command(version)]
#[command(about = "List bibliography records, reusing cached output for unchanged files", long_about = None)]
pub struct Cli {
    /// BibTeX files to list, in order
    #[arg(value_name = "BIBFILE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Directory holding cache entries (created if missing)
    #[arg(short = 'd', long = "cache-dir", value_name = "DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Record format: default, json or key
    #[arg(short = 'f', long = "format", value_name = "FORMAT", default_value = "default")]
    pub format: String,

    /// Subcache name (defaults to the format name)
    #[arg(short = 's', long = "subcache", value_name = "NAME")]
    pub subcache: Option<String>,

    /// Re-parse every file even if its cache is fresh
    #[arg(short = 'r', long = "refresh")]
    pub refresh: bool,

    /// Only report whether every file's cache is fresh (exit 1 if stale)
    #[arg(long = "check")]
    pub check: bool,

    /// Print cache diagnostics to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Give up waiting for a cache lock after N milliseconds
    #[arg(long = "lock-timeout-ms", value_name = "N")]
    pub lock_timeout_ms: Option<u64>,

    /// Treat lock markers older than N seconds as abandoned (0 = never)
    #[arg(long = "stale-lock-secs", value_name = "N", default_value = "600")]
    pub stale_lock_secs: u64,
}

impl Cli {
    /// Parse command line arguments into a Config
    pub fn into_config(self) -> Result<Config> {
        if self.refresh && self.check {
            return Err(BibCacheError::InvalidConfig(
                "specify only one of --refresh or --check".to_string(),
            ));
        }

        let format = match self.format.as_str() {
            "default" => RecordFormat::Default,
            "json" => RecordFormat::Json,
            "key" => RecordFormat::Key,
            other => {
                return Err(BibCacheError::InvalidConfig(format!(
                    "unknown format '{}' (expected default, json or key)",
                    other
                )))
            }
        };

        let subcache = self
            .subcache
            .unwrap_or_else(|| format.subcache_name().to_string());
        validate_subcache(&subcache)?;

        let mode = if self.refresh {
            Mode::Refresh
        } else if self.check {
            Mode::Check
        } else {
            Mode::Read
        };

        let defaults = Config::default();
        Ok(Config {
            sources: self.sources,
            cache_dir: self.cache_dir,
            subcache,
            format,
            mode,
            verbose: self.verbose,
            lock_poll_interval: defaults.lock_poll_interval,
            stale_lock_after: match self.stale_lock_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            lock_timeout: self.lock_timeout_ms.map(Duration::from_millis),
        })
    }
}
