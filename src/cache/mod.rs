//! Disk cache of formatted bibliography sources
//!
//! Each source file gets a key derived from its absolute path. Under the
//! cache directory, a key owns a lock marker plus one data file and one
//! timestamp file per subcache:
//!
//! ```text
//! <key>.lock
//! <key>.<subcache>
//! <key>.<subcache>.timestamp
//! ```
//!
//! An entry is fresh while its timestamp is not older than the source's
//! modification time.

mod lock;
mod naming;
mod store;

pub use lock::LockOptions;
pub use naming::validate_subcache;
pub use store::BibCache;
