//! Runtime configuration for a discovery run

use crate::resources::ProviderConfig;
use awsinv_common::defaults::{
    DEFAULT_REGION, DEFAULT_STAGGER, DEFAULT_STREAM_CAPACITY, default_cache_ttl,
};
use awsinv_common::{Region, ResourceType};
use std::path::PathBuf;
use std::time::Duration;

/// Result caching
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory for the file backend; `None` disables it
    pub dir: Option<PathBuf>,
    pub ttl: Duration,
    /// Entries kept by the memory backend; zero disables it
    pub memory_entries: usize,
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.dir.is_some() || self.memory_entries > 0
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl: default_cache_ttl(),
            memory_entries: 0,
        }
    }
}

/// Configuration for a discovery run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub regions: Vec<Region>,
    pub resource_types: Vec<ResourceType>,
    pub cache: CacheConfig,
    pub stream_capacity: usize,
    pub stagger: Duration,
    /// Inventory only the caller's account, without assuming roles
    pub local: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regions: vec![Region::from(DEFAULT_REGION)],
            resource_types: ResourceType::known(),
            cache: CacheConfig::default(),
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            stagger: DEFAULT_STAGGER,
            local: false,
        }
    }
}

impl Config {
    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            capacity: self.stream_capacity,
            stagger: self.stagger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.regions, [Region::from("us-east-1")]);
        assert_eq!(config.resource_types.len(), ResourceType::known().len());
        assert!(!config.cache.is_enabled());
        assert!(!config.local);
        assert_eq!(config.provider(), ProviderConfig::default());
    }
}
