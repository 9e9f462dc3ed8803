//! Read-through / write-through cache over an ordered chain of backends
//!
//! A [`Cache`] is an immutable value: [`Cache::with_namespace`] and
//! [`Cache::with_handlers`] return new caches sharing the backend instances.
//! Values are stored as JSON, so every backend can decode anything another
//! backend (or an earlier process) wrote.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::{MemoryCache, MemoryCacheConfig};

use awsinv_common::metrics::{labels, names};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory {} is not writable: {source}", dir.display())]
    NotWritable {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("cache I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode cache value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A storage backend
///
/// `read` returns `None` on a miss, an expired entry, or any backend failure.
pub trait CacheHandler: Send + Sync {
    /// Short backend name used in logs and metric labels
    fn kind(&self) -> &'static str;

    fn read(&self, key: &str) -> Option<Vec<u8>>;

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// Namespaced chain of cache backends
#[derive(Clone, Default)]
pub struct Cache {
    namespace: String,
    handlers: Vec<Arc<dyn CacheHandler>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn handler_kinds(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// New cache with `namespace` appended to the current one.
    pub fn with_namespace(&self, namespace: &str) -> Cache {
        let namespace = if self.namespace.is_empty() {
            namespace.to_string()
        } else {
            format!("{}:{namespace}", self.namespace)
        };

        Cache {
            namespace,
            handlers: self.handlers.clone(),
        }
    }

    /// New cache with `handlers` queried after the current ones.
    pub fn with_handlers(&self, handlers: impl IntoIterator<Item = Arc<dyn CacheHandler>>) -> Cache {
        let mut combined = self.handlers.clone();
        combined.extend(handlers);

        Cache {
            namespace: self.namespace.clone(),
            handlers: combined,
        }
    }

    /// Fully qualified key for `name`.
    pub fn key(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}:{name}", self.namespace)
        }
    }

    /// First backend hit that decodes as `T`.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.key(name);

        for handler in &self.handlers {
            let kind = handler.kind();
            metrics::counter!(names::CACHE_READ, labels::KIND => kind).increment(1);

            let Some(bytes) = handler.read(&key) else {
                continue;
            };

            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    metrics::counter!(names::CACHE_HIT, labels::KIND => kind).increment(1);
                    trace!(key = %key, kind, "Cache hit");
                    return Some(value);
                }
                Err(e) => {
                    warn!(key = %key, kind, error = %e, "Undecodable cache entry, treating as miss");
                }
            }
        }

        trace!(key = %key, "Cache miss");
        None
    }

    /// Write to every backend, returning the first failure.
    pub fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), CacheError> {
        let key = self.key(name);
        let bytes = serde_json::to_vec(value)?;

        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(e) = handler.write(&key, &bytes) {
                warn!(key = %key, kind = handler.kind(), error = %e, "Cache write failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .field("handlers", &self.handler_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Backend recording writes, optionally failing them
    #[derive(Default)]
    struct Recording {
        entries: Mutex<HashMap<String, Vec<u8>>>,
        fail_writes: bool,
    }

    impl CacheHandler for Recording {
        fn kind(&self) -> &'static str {
            "recording"
        }

        fn read(&self, key: &str) -> Option<Vec<u8>> {
            self.entries.lock().get(key).cloned()
        }

        fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
            if self.fail_writes {
                return Err(CacheError::Io {
                    path: PathBuf::from(key),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.entries.lock().insert(key.to_string(), value.to_vec());
            Ok(())
        }
    }

    fn memory() -> Arc<dyn CacheHandler> {
        Arc::new(MemoryCache::new(MemoryCacheConfig {
            ttl: Duration::from_secs(60),
            max_entries: 16,
        }))
    }

    #[test]
    fn namespaces_compose() {
        let cache = Cache::new().with_namespace("111").with_namespace("eu-west-1");
        assert_eq!(cache.namespace(), "111:eu-west-1");
        assert_eq!(cache.key("aws::ec2::vpc"), "111:eu-west-1:aws::ec2::vpc");
        assert_eq!(Cache::new().key("bare"), "bare");
    }

    #[test]
    fn builders_do_not_mutate_original() {
        let base = Cache::new().with_namespace("a");
        let derived = base.with_namespace("b").with_handlers([memory()]);
        assert_eq!(base.namespace(), "a");
        assert!(base.is_empty());
        assert_eq!(derived.namespace(), "a:b");
        assert_eq!(derived.handler_kinds(), ["memory"]);
    }

    #[test]
    fn round_trip() {
        let cache = Cache::new().with_namespace("ns").with_handlers([memory()]);
        cache.write("k", &vec![1u32, 2, 3]).unwrap();
        assert_eq!(cache.read::<Vec<u32>>("k"), Some(vec![1, 2, 3]));
        assert_eq!(cache.read::<Vec<u32>>("other"), None);
    }

    #[test]
    fn read_falls_through_to_later_handler() {
        let first: Arc<dyn CacheHandler> = memory();
        let second = Arc::new(Recording::default());
        second
            .entries
            .lock()
            .insert("ns:k".to_string(), b"\"from-second\"".to_vec());

        let cache = Cache::new()
            .with_namespace("ns")
            .with_handlers([first, second as Arc<dyn CacheHandler>]);
        assert_eq!(cache.read::<String>("k").as_deref(), Some("from-second"));
    }

    #[test]
    fn undecodable_entry_is_a_miss() {
        let handler = Arc::new(Recording::default());
        handler.entries.lock().insert("k".to_string(), b"{not json".to_vec());
        let cache = Cache::new().with_handlers([handler as Arc<dyn CacheHandler>]);
        assert_eq!(cache.read::<String>("k"), None);
    }

    #[test]
    fn write_reaches_all_handlers_and_returns_first_error() {
        let failing = Arc::new(Recording {
            fail_writes: true,
            ..Default::default()
        });
        let healthy = Arc::new(Recording::default());
        let cache = Cache::new().with_handlers([
            failing.clone() as Arc<dyn CacheHandler>,
            healthy.clone() as Arc<dyn CacheHandler>,
        ]);

        let err = cache.write("k", "v").unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(healthy.entries.lock().contains_key("k"));
        assert_eq!(cache.read::<String>("k").as_deref(), Some("v"));
    }
}
