//! bibcache - cached bibliography listings
//!
//! Lists the records of BibTeX files one per line, reusing formatted
//! output stored on disk for files that have not changed since.

mod bibtex;
mod cache;
mod cli;
mod config;
mod diagnostics;
mod error;
mod format;

use bibtex::BibtexParser;
use cache::BibCache;
use clap::Parser;
use cli::Cli;
use config::{Config, Mode};
use diagnostics::Diagnostics;
use error::{BibCacheError, Result};
use format::formatter_for;
use std::fs;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(&config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(config: &Config) -> Result<ExitCode> {
    if !config.cache_dir.exists() {
        fs::create_dir_all(&config.cache_dir).map_err(|e| BibCacheError::CacheWrite {
            path: config.cache_dir.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    let diagnostics = Diagnostics::stderr(config.verbose);
    diagnostics.debug(&format!(
        "using cache '{}' (subcache '{}')",
        config.cache_dir.display(),
        config.subcache
    ));

    let cache = BibCache::new(&config.cache_dir, BibtexParser::new())
        .with_lock_options(config.lock_options())
        .with_diagnostics(diagnostics);

    if config.mode == Mode::Check {
        let fresh = cache.is_fresh_all(&config.subcache, &config.sources)?;
        println!("{}", if fresh { "fresh" } else { "stale" });
        return Ok(if fresh {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let formatter = formatter_for(config.format);
    let mut out = BufWriter::new(io::stdout().lock());
    let mut write_error = None;
    let sink = |line: &str| {
        if write_error.is_none() {
            if let Err(e) = writeln!(out, "{}", line) {
                write_error = Some(e);
            }
        }
    };

    match config.mode {
        Mode::Refresh => {
            cache.refresh_and_do(&config.sources, &config.subcache, &formatter, sink)?
        }
        _ => cache.read_and_do(&config.sources, &config.subcache, &formatter, sink)?,
    }

    match write_error.map_or_else(|| out.flush(), Err) {
        // Reader went away (e.g. `| head`); nothing left to show
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(ExitCode::SUCCESS),
        Err(e) => Err(e.into()),
        Ok(()) => Ok(ExitCode::SUCCESS),
    }
}
