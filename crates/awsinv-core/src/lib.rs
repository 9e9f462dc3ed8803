//! awsinv-core - multi-account AWS resource discovery
//!
//! Credentials are discovered from the caller's IAM role, fanned out into
//! per-(account, region) gateways, and fetched concurrently per resource type
//! through an observer with a middleware chain.

pub mod aws;
pub mod cache;
pub mod config;
pub mod gateway;
pub mod resources;
pub mod service;

#[cfg(test)]
mod testing;
