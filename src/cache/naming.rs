//! Cache key derivation and on-disk file names

use crate::error::{BibCacheError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the file holding a subcache's write time
const TIMESTAMP_SUFFIX: &str = "timestamp";

/// Suffix of the per-key lock marker
const LOCK_SUFFIX: &str = "lock";

/// Hex SHA-256 digest of a source file's absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Digest an already absolute path; no filesystem access
    pub fn from_absolute(path: &Path) -> Self {
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<key>.lock`
    pub fn lock_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("{}.{}", self.0, LOCK_SUFFIX))
    }

    /// `<key>.<subcache>`
    pub fn data_path(&self, cache_dir: &Path, subcache: &str) -> PathBuf {
        cache_dir.join(format!("{}.{}", self.0, subcache))
    }

    /// `<key>.<subcache>.timestamp`
    pub fn timestamp_path(&self, cache_dir: &Path, subcache: &str) -> PathBuf {
        cache_dir.join(format!("{}.{}.{}", self.0, subcache, TIMESTAMP_SUFFIX))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve `source` against the current directory and derive its key
pub fn cache_name(source: &Path) -> Result<CacheKey> {
    let absolute = fs::canonicalize(source).map_err(|e| BibCacheError::SourceUnavailable {
        path: source.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(CacheKey::from_absolute(&absolute))
}

/// Reject subcache names that would escape the cache directory or
/// collide with lock and timestamp files
pub fn validate_subcache(subcache: &str) -> Result<()> {
    let invalid = subcache.is_empty()
        || subcache == "."
        || subcache == ".."
        || subcache == LOCK_SUFFIX
        || subcache == TIMESTAMP_SUFFIX
        || subcache.ends_with(&format!(".{}", TIMESTAMP_SUFFIX))
        || subcache.contains(['/', '\\', '\0']);
    if invalid {
        return Err(BibCacheError::InvalidSubcache(subcache.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_lowercase_hex_sha256() {
        let key = CacheKey::from_absolute(Path::new("/home/user/refs.bib"));
        assert_eq!(key.as_str().len(), 64);
        assert!(key
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        let key = CacheKey::from_absolute(Path::new("abc"));
        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_paths_do_not_collide() {
        let keys: HashSet<String> = (0..1000)
            .map(|i| {
                let path = PathBuf::from(format!("/library/shelf-{}/refs-{}.bib", i % 7, i));
                CacheKey::from_absolute(&path).as_str().to_string()
            })
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_same_file_same_key_via_relative_and_absolute() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("refs.bib");
        fs::write(&source, "").unwrap();

        let dotted = temp.path().join(".").join("refs.bib");
        assert_eq!(cache_name(&source).unwrap(), cache_name(&dotted).unwrap());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = cache_name(&temp.path().join("absent.bib"));
        assert!(matches!(
            result,
            Err(BibCacheError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_file_names() {
        let key = CacheKey::from_absolute(Path::new("abc"));
        let dir = Path::new("/tmp/cache");
        let hex = key.as_str();
        assert_eq!(key.lock_path(dir), dir.join(format!("{}.lock", hex)));
        assert_eq!(key.data_path(dir, "default"), dir.join(format!("{}.default", hex)));
        assert_eq!(
            key.timestamp_path(dir, "default"),
            dir.join(format!("{}.default.timestamp", hex))
        );
    }

    #[test]
    fn test_validate_subcache() {
        assert!(validate_subcache("default").is_ok());
        assert!(validate_subcache("json-v2").is_ok());
        for bad in ["", ".", "..", "lock", "timestamp", "a.timestamp", "a/b", "a\\b"] {
            assert!(
                matches!(validate_subcache(bad), Err(BibCacheError::InvalidSubcache(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }
}
