use alloc::string::{String, ToString as _};
use sha2::{Digest as _, Sha256};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use super::CacheStore;
use crate::errors::CacheErrorKind;

/// Stores each entry in its own file named by the hex SHA-256 of the key
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens the store, creating `dir` and its parents if needed.
    ///
    /// # Errors
    /// Returns [`CacheErrorKind::Io`] if the directory can't be created
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheErrorKind> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheErrorKind::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(hex::encode(Sha256::digest(key.as_bytes())))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                debug!("{}", CacheErrorKind::Io { key: key.to_string(), source });
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "Cache directory is missing");
            return false;
        }
        match fs::write(self.path(key), value) {
            Ok(()) => true,
            Err(source) => {
                warn!("{}", CacheErrorKind::Io { key: key.to_string(), source });
                false
            }
        }
    }

    fn delete(&self, key: &str) {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                warn!("{}", CacheErrorKind::Io {
                    key: key.to_string(),
                    source: err,
                });
            }
            _ => {}
        }
    }

    fn clear(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %self.dir.display(), "Cache directory can't be read: {err}");
                return;
            }
        };
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|file_type| file_type.is_file()) {
                continue;
            }
            if let Err(err) = fs::remove_file(entry.path()) {
                warn!(path = %entry.path().display(), "Cache file can't be removed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheStore as _, FileCache};

    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();

        assert!(cache.set("user:1", r#"{"name":"Alice"}"#));
        assert_eq!(cache.get("user:1").as_deref(), Some(r#"{"name":"Alice"}"#));
    }

    #[test]
    fn test_get_missing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();

        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_keys_are_hashed() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();
        cache.set("app::services::OrderService", "data");

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].len(), 64);
        assert!(names[0].chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();
        cache.set("session:abc", "data");
        cache.delete("session:abc");
        cache.delete("session:abc");

        assert!(cache.get("session:abc").is_none());
    }

    #[test]
    fn test_clear_keeps_directories() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path()).unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        cache.set("a", "1");
        cache.set("b", "2");
        cache.clear();

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
        assert!(temp_dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_creates_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("sub");
        let cache = FileCache::new(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(cache.dir(), dir.as_path());
    }

    #[test]
    fn test_set_fails_without_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("gone");
        let cache = FileCache::new(&dir).unwrap();
        fs::remove_dir(&dir).unwrap();

        assert!(!cache.set("key", "value"));
        assert!(cache.get("key").is_none());
    }
}
