//! Default configuration values shared across awsinv components

use std::time::Duration;

/// Region used for identity and IAM calls made with the default credential chain
pub const DEFAULT_REGION: &str = "us-east-1";

/// Region whose gateways are preferred when fetching global resource types
pub const PRIMARY_REGION: &str = "eu-central-1";

/// Capacity of the bounded stream between a provider and its reader
pub const DEFAULT_STREAM_CAPACITY: usize = 10_000;

/// Delay between launching per-gateway fetch tasks
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(100);

/// Maximum attempts for SDK calls made with assumed credentials
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Upper bound on SDK retry backoff
pub const DEFAULT_RETRY_MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Default cache TTL in seconds (1 hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default number of entries held by the in-memory cache
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 1024;

/// IAM action that grants cross-account role assumption
pub const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

/// Session name used when assuming discovered roles
pub const DEFAULT_SESSION_NAME: &str = "awsinv";

/// Returns the default cache TTL
pub fn default_cache_ttl() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_TTL_SECS)
}
