//! Shared test utilities for awsinv
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection for integration tests
//! - [`fixtures`]: Entity and identifier fixtures

pub mod aws;
pub mod fixtures;

// Re-export commonly used items
pub use aws::{get_test_region, get_test_regions};
pub use fixtures::{account, entities, entity, region};
