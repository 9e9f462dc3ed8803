//! awsinv-common - Shared identifiers and entity types
//!
//! This crate holds the types every layer of the discovery pipeline agrees on,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`account`]: Account IDs, role ARNs and ARN parsing
//! - [`defaults`]: Default configuration values
//! - [`entity`]: The common resource representation
//! - [`metrics`]: Metric names shared by emitters and exporters
//! - [`payload`]: Closed set of per-service entity payloads
//! - [`region`]: Region codes and their description table
//! - [`resource_type`]: Open resource type tags and their scope

pub mod account;
pub mod defaults;
pub mod entity;
pub mod metrics;
pub mod payload;
pub mod region;
pub mod resource_type;

// Re-export commonly used types
pub use account::{AccountId, Arn, ArnError, RoleArn};
pub use entity::{Entity, build_arn};
pub use payload::Payload;
pub use region::Region;
pub use resource_type::{ResourceScope, ResourceType};
