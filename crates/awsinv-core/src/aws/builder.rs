//! Construction of client handles from default or assumed credentials

use super::account::get_caller_identity;
use super::client::ClientHandle;
use super::context::AwsContext;
use super::credentials::AwsIdentitySource;
use anyhow::{Context, Result};
use awsinv_common::defaults::DEFAULT_REGION;
use awsinv_common::{AccountId, Region, RoleArn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// Trait for building client handles.
pub trait ClientBuilder: Send + Sync {
    /// Handle using `role`'s credentials, scoped to `region`
    fn assume_client(
        &self,
        role: &RoleArn,
        account_id: &AccountId,
        region: &Region,
    ) -> impl Future<Output = Result<ClientHandle>> + Send;

    /// Handle using the default credential chain, scoped to `region`
    fn local_client(&self, region: &Region) -> impl Future<Output = Result<ClientHandle>> + Send;
}

/// [`ClientBuilder`] backed by the AWS SDK
///
/// Assumed credentials are built once per role and shared across regions.
pub struct AwsClientBuilder {
    default: AwsContext,
    roles: Mutex<HashMap<RoleArn, AwsContext>>,
    verify: bool,
}

impl AwsClientBuilder {
    /// Load the default credential chain in [`DEFAULT_REGION`].
    pub async fn new() -> Self {
        Self::from_context(AwsContext::new(DEFAULT_REGION).await)
    }

    pub fn from_context(default: AwsContext) -> Self {
        Self {
            default,
            roles: Mutex::new(HashMap::new()),
            verify: true,
        }
    }

    /// Whether assumed clients are checked with GetCallerIdentity before use.
    ///
    /// Verification surfaces disabled regions and missing trust at pool
    /// construction, where the pair is skipped, instead of at fetch time.
    pub fn verify_credentials(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn default_context(&self) -> &AwsContext {
        &self.default
    }

    /// Identity source over the default credentials, for role discovery.
    pub fn identity_source(&self) -> AwsIdentitySource {
        AwsIdentitySource::new(&self.default)
    }

    async fn role_context(&self, role: &RoleArn) -> AwsContext {
        if let Some(ctx) = self.roles.lock().get(role) {
            return ctx.clone();
        }

        debug!(role = %role, "Building assumed-role credentials");
        let ctx = AwsContext::assume_role(&self.default, role).await;

        self.roles
            .lock()
            .entry(role.clone())
            .or_insert(ctx)
            .clone()
    }
}

impl ClientBuilder for AwsClientBuilder {
    async fn assume_client(
        &self,
        role: &RoleArn,
        account_id: &AccountId,
        region: &Region,
    ) -> Result<ClientHandle> {
        debug!(role = %role, region = %region, "Assuming client");

        let ctx = self.role_context(role).await.with_region(region);
        let identity = if self.verify {
            Some(
                get_caller_identity(&ctx)
                    .await
                    .with_context(|| format!("Cannot use role {role} in {region}"))?,
            )
        } else {
            None
        };

        Ok(ClientHandle::new(ctx)
            .with_account(account_id.clone())
            .with_identity(identity))
    }

    async fn local_client(&self, region: &Region) -> Result<ClientHandle> {
        debug!(region = %region, "Building local client");
        Ok(ClientHandle::new(self.default.with_region(region)))
    }
}
