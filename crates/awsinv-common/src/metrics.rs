//! Metric names emitted through the `metrics` facade.
//!
//! Kept here so the library and any exporter wiring agree on names without
//! pulling the facade into this crate.

/// Label keys
pub mod labels {
    pub const RESOURCE_TYPE: &str = "resource_type";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const REGION: &str = "region";
    pub const KIND: &str = "kind";
}

/// Counter and gauge names
pub mod names {
    /// Entities dropped because a provider stream was full
    pub const QUEUE_FULL: &str = "awsinv_resource_queue_full_total";
    /// Provider runs started
    pub const OBSERVER_EXECUTION: &str = "awsinv_observer_execution_total";
    /// Gateway fetches that failed inside a provider run
    pub const FETCH_FAILURE: &str = "awsinv_fetch_failure_total";
    /// Cache lookups per backend kind
    pub const CACHE_READ: &str = "awsinv_cache_read_total";
    /// Cache hits per backend kind
    pub const CACHE_HIT: &str = "awsinv_cache_hit_total";
    /// Assumable roles that replaced an earlier role for the same account
    pub const ROLE_OVERWRITE: &str = "awsinv_role_overwrite_total";
    /// Latest resource count per type, account and region
    pub const RESOURCES: &str = "awsinv_resources";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_share_prefix() {
        for name in [
            names::QUEUE_FULL,
            names::OBSERVER_EXECUTION,
            names::FETCH_FAILURE,
            names::CACHE_READ,
            names::CACHE_HIT,
            names::ROLE_OVERWRITE,
            names::RESOURCES,
        ] {
            assert!(name.starts_with("awsinv_"), "{name} missing prefix");
        }
    }
}
