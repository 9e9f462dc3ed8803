//! Per-(account, region) fetch facades
//!
//! A [`Gateway`] answers "every entity of type T" for one account and region.
//! [`AwsGateway`] is the only place that maps resource types to service
//! adapters; supporting a new type means adding an arm to its dispatch.

pub mod cached;
pub mod pool;

pub use cached::CachedGateway;
pub use pool::GatewayPool;

use crate::aws::client::ClientHandle;
use crate::aws::error::AwsError;
use crate::service::ec2::Ec2Repository;
use crate::service::iam::IamRepository;
use crate::service::s3::S3Repository;
use crate::service::Scope;
use awsinv_common::{AccountId, Entity, Region, ResourceType};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("resource type {0} not supported")]
    UnsupportedResourceType(ResourceType),

    #[error("fetch of {0} cancelled")]
    Cancelled(ResourceType),

    #[error("{operation} failed: {source}")]
    Aws {
        operation: &'static str,
        source: AwsError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Trait for fetching every entity of a resource type.
pub trait Gateway: Send + Sync + 'static {
    fn account_id(&self) -> &AccountId;

    fn region(&self) -> &Region;

    fn find_all(
        &self,
        resource_type: &ResourceType,
    ) -> impl Future<Output = Result<Vec<Entity>, GatewayError>> + Send;
}

impl<G: Gateway> Gateway for Arc<G> {
    fn account_id(&self) -> &AccountId {
        (**self).account_id()
    }

    fn region(&self) -> &Region {
        (**self).region()
    }

    fn find_all(
        &self,
        resource_type: &ResourceType,
    ) -> impl Future<Output = Result<Vec<Entity>, GatewayError>> + Send {
        (**self).find_all(resource_type)
    }
}

/// Gateway dispatching to the AWS service adapters
pub struct AwsGateway {
    handle: Arc<ClientHandle>,
    scope: Scope,
}

impl AwsGateway {
    /// Bind to a handle, resolving its account if not already known.
    pub async fn new(handle: Arc<ClientHandle>) -> anyhow::Result<Self> {
        let account_id = handle.account_id().await?;
        let region = handle.region().clone();
        Ok(Self {
            handle,
            scope: Scope::new(account_id, region),
        })
    }

    /// Token checked between pages of multi-page listings.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.scope.cancel = cancel;
        self
    }
}

impl Gateway for AwsGateway {
    fn account_id(&self) -> &AccountId {
        &self.scope.account_id
    }

    fn region(&self) -> &Region {
        &self.scope.region
    }

    async fn find_all(&self, resource_type: &ResourceType) -> Result<Vec<Entity>, GatewayError> {
        let scope = self.scope.clone();

        let items = match resource_type.canonical_name().as_str() {
            "aws::ec2::instance" => Ec2Repository::new(self.handle.ec2(), scope).list_instances_all().await?,
            "aws::ec2::volume" => Ec2Repository::new(self.handle.ec2(), scope).list_volumes_all().await?,
            "aws::ec2::vpc" => Ec2Repository::new(self.handle.ec2(), scope).list_vpcs_all().await?,
            "aws::ec2::snapshot" => Ec2Repository::new(self.handle.ec2(), scope).list_snapshots_all().await?,
            "aws::s3::bucket" => S3Repository::new(self.handle.s3(), scope).list_buckets_all().await?,
            "aws::iam::user" => IamRepository::new(self.handle.iam(), scope).list_users_all().await?,
            _ => return Err(GatewayError::UnsupportedResourceType(resource_type.clone())),
        };

        debug!(
            account_id = %self.scope.account_id,
            region = %self.scope.region,
            resource_type = %resource_type,
            count = items.len(),
            "Fetched resources"
        );
        Ok(items)
    }
}

impl std::fmt::Debug for AwsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsGateway")
            .field("account_id", &self.scope.account_id)
            .field("region", &self.scope.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::offline_context;

    async fn gateway() -> AwsGateway {
        let handle = ClientHandle::new(offline_context("eu-west-1")).with_account(AccountId::from("1"));
        AwsGateway::new(Arc::new(handle)).await.unwrap()
    }

    #[tokio::test]
    async fn binds_account_and_region() {
        let gw = gateway().await;
        assert_eq!(gw.account_id(), &AccountId::from("1"));
        assert_eq!(gw.region(), &Region::from("eu-west-1"));
    }

    #[tokio::test]
    async fn unknown_type_is_unsupported() {
        let gw = gateway().await;
        let err = gw
            .find_all(&ResourceType::new("AWS::Glue::Job"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resource type AWS::Glue::Job not supported");
        assert!(matches!(err, GatewayError::UnsupportedResourceType(_)));
    }
}
