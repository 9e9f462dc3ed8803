//! AWS credential and client plumbing
//!
//! - context: shared SDK configuration, role assumption, retry policy
//! - credentials: assumable-role discovery from attached IAM policies
//! - builder / pool: memoized client handles per (account, region)
//! - error: SDK error classification

pub mod account;
pub mod builder;
pub mod client;
pub mod context;
pub mod credentials;
pub mod error;
pub mod iam;
pub mod policy;
pub mod pool;

pub use account::{CallerIdentity, get_caller_identity};
pub use builder::{AwsClientBuilder, ClientBuilder};
pub use client::ClientHandle;
pub use context::AwsContext;
pub use credentials::{
    AwsIdentitySource, CredentialResolver, IdentitySource, ResolutionError, RoleMap,
};
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
pub use pool::{AwsClientPool, ClientPool, LocalClientPool, PoolError};
