//! Diagnostic message reporting
//!
//! Cache operations report what they do through an injected callback
//! instead of printing directly, so the binary can route messages to
//! stderr and tests can capture them.

use std::fmt;
use std::sync::Arc;

/// Callback receiving one diagnostic message at a time
pub type Reporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Verbosity-aware sink for diagnostic messages
#[derive(Clone)]
pub struct Diagnostics {
    reporter: Reporter,
    verbose: bool,
}

impl Diagnostics {
    /// Create a new Diagnostics sink
    ///
    /// # Arguments
    /// * `verbose` - Whether `debug` messages are forwarded
    /// * `reporter` - Callback receiving each message
    pub fn new(verbose: bool, reporter: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            reporter: Arc::new(reporter),
            verbose,
        }
    }

    /// Diagnostics writing to stderr
    pub fn stderr(verbose: bool) -> Self {
        Self::new(verbose, |msg| eprintln!("{}", msg))
    }

    /// Diagnostics that discard every message
    pub fn silent() -> Self {
        Self::new(false, |_| {})
    }

    /// Report a message only shown in verbose mode
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            (self.reporter)(msg);
        }
    }

    /// Report a message that is always shown
    pub fn warn(&self, msg: &str) {
        (self.reporter)(&format!("Warning: {}", msg));
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
