//! Gateway selection per resource type

use super::cached::CachedGateway;
use super::{AwsGateway, Gateway};
use crate::aws::client::ClientHandle;
use crate::cache::Cache;
use awsinv_common::defaults::PRIMARY_REGION;
use awsinv_common::{AccountId, Region, ResourceType};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One gateway per (account, region), with global-type deduplication
pub struct GatewayPool<G> {
    gateways: Vec<Arc<G>>,
    primary_region: Region,
}

impl<G> Clone for GatewayPool<G> {
    fn clone(&self) -> Self {
        Self {
            gateways: self.gateways.clone(),
            primary_region: self.primary_region.clone(),
        }
    }
}

impl<G: Gateway> GatewayPool<G> {
    pub fn new(gateways: impl IntoIterator<Item = G>) -> Self {
        Self::from_shared(gateways.into_iter().map(Arc::new))
    }

    pub fn from_shared(gateways: impl IntoIterator<Item = Arc<G>>) -> Self {
        Self {
            gateways: gateways.into_iter().collect(),
            primary_region: Region::from(PRIMARY_REGION),
        }
    }

    /// Region preferred for global resource types.
    pub fn with_primary_region(mut self, region: Region) -> Self {
        self.primary_region = region;
        self
    }

    pub fn gateways(&self) -> &[Arc<G>] {
        &self.gateways
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Gateways to query for `resource_type`.
    ///
    /// Regional types get every gateway. Global types get the gateways in the
    /// primary region, or failing that the first gateway seen per account.
    pub fn list(&self, resource_type: &ResourceType) -> Vec<Arc<G>> {
        if !resource_type.is_global() {
            return self.gateways.clone();
        }

        let primary: Vec<Arc<G>> = self
            .gateways
            .iter()
            .filter(|g| g.region() == &self.primary_region)
            .cloned()
            .collect();
        if !primary.is_empty() {
            return primary;
        }

        let mut seen: HashSet<&AccountId> = HashSet::new();
        self.gateways
            .iter()
            .filter(|g| seen.insert(g.account_id()))
            .cloned()
            .collect()
    }

    /// Same selection, with every gateway reading and writing through `cache`.
    pub fn with_cache(&self, cache: &Cache) -> GatewayPool<CachedGateway<Arc<G>>> {
        GatewayPool {
            gateways: self
                .gateways
                .iter()
                .map(|g| Arc::new(CachedGateway::new(Arc::clone(g), cache)))
                .collect(),
            primary_region: self.primary_region.clone(),
        }
    }
}

impl GatewayPool<AwsGateway> {
    /// One gateway per client handle; handles whose account cannot be
    /// resolved are logged and skipped.
    pub async fn from_clients(clients: Vec<Arc<ClientHandle>>, cancel: CancellationToken) -> Self {
        let attempts = clients.into_iter().map(|handle| {
            let cancel = cancel.clone();
            async move {
                let region = handle.region().clone();
                match AwsGateway::new(handle).await {
                    Ok(gw) => Some(gw.with_cancellation(cancel)),
                    Err(e) => {
                        warn!(region = %region, error = %e, "Failed to resolve client account. Skipping");
                        None
                    }
                }
            }
        });

        GatewayPool::new(join_all(attempts).await.into_iter().flatten())
    }
}
