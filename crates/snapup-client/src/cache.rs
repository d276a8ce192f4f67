//! Cross-run session cache.
//!
//! Two independent single-line files in the cache directory (the OS temp
//! dir by default): the last appliance address and the last session token.
//! A missing file always means "unknown".
//!
//! The files are not locked. Two concurrent runs may race on the same key;
//! the last writer wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use snapup_core::SnapResult;
use tracing::{debug, warn};

/// The two values the cache holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    LastAddress,
    LastToken,
}

impl CacheKey {
    fn file_name(self) -> &'static str {
        match self {
            Self::LastAddress => "snapup.address",
            Self::LastToken => "snapup.token",
        }
    }
}

/// Filesystem-backed store for [`CacheKey`] values.
#[derive(Debug, Clone)]
pub struct SessionCache {
    dir: PathBuf,
}

impl SessionCache {
    /// Create a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A cache in the OS temp directory.
    pub fn default_location() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read the stored value, or `None` when nothing usable is stored.
    ///
    /// Never fails: unreadable files count as absent.
    pub fn read(&self, key: CacheKey) -> Option<String> {
        let path = self.path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                return None;
            }
        };

        let value = content.lines().next().unwrap_or_default().trim();
        if value.is_empty() {
            return None;
        }
        debug!(?key, "cache hit");
        Some(value.to_string())
    }

    /// Store `value` under `key`, replacing what was there.
    pub fn write(&self, key: CacheKey, value: &str) -> SnapResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.path(key);
        fs::write(&path, format!("{}\n", value.trim()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(?key, path = %path.display(), "cache updated");
        Ok(())
    }

    /// Remove the stored value. Removing an absent value is not an error.
    pub fn clear(&self, key: CacheKey) -> SnapResult<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {
                debug!(?key, "cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and immediately clear a value, for one-shot hints.
    pub fn take(&self, key: CacheKey) -> Option<String> {
        let value = self.read(key);
        if let Err(e) = self.clear(key) {
            warn!(?key, error = %e, "failed to clear cache entry");
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache() -> (tempfile::TempDir, SessionCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn read_without_write_is_absent() {
        let (_dir, cache) = temp_cache();
        assert_eq!(cache.read(CacheKey::LastAddress), None);
        assert_eq!(cache.read(CacheKey::LastToken), None);
    }

    #[test]
    fn write_then_read() {
        let (_dir, cache) = temp_cache();
        cache.write(CacheKey::LastToken, "tok-1").unwrap();
        assert_eq!(cache.read(CacheKey::LastToken).as_deref(), Some("tok-1"));
    }

    #[test]
    fn last_write_wins() {
        let (_dir, cache) = temp_cache();
        cache.write(CacheKey::LastAddress, "10.0.0.2").unwrap();
        cache.write(CacheKey::LastAddress, "10.0.0.3").unwrap();
        assert_eq!(cache.read(CacheKey::LastAddress).as_deref(), Some("10.0.0.3"));
    }

    #[test]
    fn keys_are_independent() {
        let (_dir, cache) = temp_cache();
        cache.write(CacheKey::LastAddress, "10.0.0.2").unwrap();
        cache.write(CacheKey::LastToken, "tok").unwrap();
        cache.clear(CacheKey::LastToken).unwrap();
        assert_eq!(cache.read(CacheKey::LastToken), None);
        assert_eq!(cache.read(CacheKey::LastAddress).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn read_after_clear_is_absent() {
        let (_dir, cache) = temp_cache();
        cache.write(CacheKey::LastToken, "tok").unwrap();
        cache.clear(CacheKey::LastToken).unwrap();
        assert_eq!(cache.read(CacheKey::LastToken), None);
    }

    #[test]
    fn clear_when_absent_is_noop() {
        let (_dir, cache) = temp_cache();
        cache.clear(CacheKey::LastAddress).unwrap();
        cache.clear(CacheKey::LastAddress).unwrap();
    }

    #[test]
    fn only_first_line_is_used() {
        let (_dir, cache) = temp_cache();
        fs::write(cache.path(CacheKey::LastToken), "  tok-2  \ngarbage\n").unwrap();
        assert_eq!(cache.read(CacheKey::LastToken).as_deref(), Some("tok-2"));
    }

    #[test]
    fn blank_file_is_absent() {
        let (_dir, cache) = temp_cache();
        fs::write(cache.path(CacheKey::LastToken), "\n").unwrap();
        assert_eq!(cache.read(CacheKey::LastToken), None);
    }

    #[test]
    fn take_reads_once() {
        let (_dir, cache) = temp_cache();
        cache.write(CacheKey::LastAddress, "10.0.0.9").unwrap();
        assert_eq!(cache.take(CacheKey::LastAddress).as_deref(), Some("10.0.0.9"));
        assert_eq!(cache.take(CacheKey::LastAddress), None);
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("nested").join("cache"));
        cache.write(CacheKey::LastAddress, "10.0.0.4").unwrap();
        assert_eq!(cache.read(CacheKey::LastAddress).as_deref(), Some("10.0.0.4"));
    }
}
