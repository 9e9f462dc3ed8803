//! In-memory cache backend with TTL and a bounded entry count

use super::{CacheError, CacheHandler};
use awsinv_common::defaults::{DEFAULT_MEMORY_CACHE_ENTRIES, default_cache_ttl};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// In-memory cache configuration
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Lifetime of each entry
    pub ttl: Duration,

    /// Maximum number of entries; 0 stores nothing
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            max_entries: DEFAULT_MEMORY_CACHE_ENTRIES,
        }
    }
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Process-local cache; one lock serializes all keys
pub struct MemoryCache {
    config: MemoryCacheConfig,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new(config: MemoryCacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make room for one entry: drop expired entries, then the soonest to expire.
    fn evict(entries: &mut HashMap<String, Entry>, max_entries: usize, now: Instant) {
        entries.retain(|_, e| e.expires_at > now);

        while entries.len() >= max_entries {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            trace!(key = %oldest, "Evicting memory cache entry");
            entries.remove(&oldest);
        }
    }
}

impl CacheHandler for MemoryCache {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(e) if e.expires_at > now => Some(e.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        if self.config.max_entries == 0 {
            return Ok(());
        }

        let mut entries = self.entries.lock();
        let now = Instant::now();

        if !entries.contains_key(key) && entries.len() >= self.config.max_entries {
            Self::evict(&mut entries, self.config.max_entries, now);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: now + self.config.ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl: Duration, max_entries: usize) -> MemoryCache {
        MemoryCache::new(MemoryCacheConfig { ttl, max_entries })
    }

    #[test]
    fn round_trip() {
        let c = cache(Duration::from_secs(60), 8);
        c.write("k", b"value").unwrap();
        assert_eq!(c.read("k").as_deref(), Some(&b"value"[..]));
        assert_eq!(c.read("missing"), None);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let c = cache(Duration::from_millis(20), 8);
        c.write("k", b"value").unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(c.read("k"), None);
        assert!(c.is_empty());
    }

    #[test]
    fn capacity_evicts_soonest_expiring() {
        let c = cache(Duration::from_secs(60), 2);
        c.write("a", b"1").unwrap();
        std::thread::sleep(Duration::from_millis(2));
        c.write("b", b"2").unwrap();
        c.write("c", b"3").unwrap();

        assert_eq!(c.len(), 2);
        assert_eq!(c.read("a"), None);
        assert!(c.read("b").is_some());
        assert!(c.read("c").is_some());
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let c = cache(Duration::from_secs(60), 0);
        c.write("a", b"1").unwrap();
        c.write("b", b"2").unwrap();
        assert!(c.is_empty());
        assert_eq!(c.read("a"), None);
    }

    #[test]
    fn overwrite_at_capacity_keeps_others() {
        let c = cache(Duration::from_secs(60), 2);
        c.write("a", b"1").unwrap();
        c.write("b", b"2").unwrap();
        c.write("a", b"3").unwrap();
        assert_eq!(c.read("a").as_deref(), Some(&b"3"[..]));
        assert!(c.read("b").is_some());
    }
}
