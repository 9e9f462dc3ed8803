//! One-file-per-key cache backend
//!
//! Freshness comes from the file's modification time alone; nothing about
//! expiry is stored inside the file.

use super::{CacheError, CacheHandler};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};

const PROBE_FILE: &str = ".awsinv-write-probe";

/// Directory-backed cache; one lock serializes all keys
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
    lock: Mutex<()>,
}

impl FileCache {
    /// Create the backend, creating `dir` if needed and checking it is writable.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, CacheError> {
        let dir = dir.into();
        let not_writable = |source| CacheError::NotWritable {
            dir: dir.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(not_writable)?;
        let probe = dir.join(PROBE_FILE);
        fs::write(&probe, b"").map_err(not_writable)?;
        fs::remove_file(&probe).map_err(not_writable)?;

        debug!(dir = %dir.display(), ttl_secs = ttl.as_secs(), "File cache ready");
        Ok(Self {
            dir,
            ttl,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("aws.{}.json", urlencoding::encode(key)))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        age <= self.ttl
    }
}

impl CacheHandler for FileCache {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let _guard = self.lock.lock();
        let path = self.path_for(key);

        if !self.is_fresh(&path) {
            trace!(path = %path.display(), "File cache miss or expired");
            return None;
        }
        fs::read(&path).ok()
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_secs(60)).unwrap();

        cache.write("1:eu-west-1:aws::ec2::vpc", b"[1,2]").unwrap();
        assert_eq!(
            cache.read("1:eu-west-1:aws::ec2::vpc").as_deref(),
            Some(&b"[1,2]"[..])
        );
        assert_eq!(cache.read("1:eu-west-1:aws::ec2::volume"), None);
    }

    #[test]
    fn file_name_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_secs(60)).unwrap();
        let path = cache.path_for("1:us-east-1:aws::iam::user");
        assert_eq!(path, cache.path_for("1:us-east-1:aws::iam::user"));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "aws.1%3Aus-east-1%3Aaws%3A%3Aiam%3A%3Auser.json"
        );
    }

    #[test]
    fn expired_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_millis(20)).unwrap();
        cache.write("k", b"v").unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.read("k"), None);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let cache = FileCache::new(&nested, Duration::from_secs(1)).unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.dir(), nested);
    }

    #[test]
    fn unwritable_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let err = FileCache::new(blocker.join("sub"), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CacheError::NotWritable { .. }));
    }
}
