//! Read-through / write-through caching decorator for gateways

use super::{Gateway, GatewayError};
use crate::cache::Cache;
use awsinv_common::{AccountId, Entity, Region, ResourceType};
use tracing::{debug, warn};

/// Gateway whose results are cached under `account:region:<type>`
///
/// Cache failures never fail a fetch: an unreadable entry is a miss and a
/// failed write is logged.
pub struct CachedGateway<G> {
    inner: G,
    cache: Cache,
}

impl<G: Gateway> CachedGateway<G> {
    pub fn new(inner: G, cache: &Cache) -> Self {
        let cache = cache.with_namespace(&format!("{}:{}", inner.account_id(), inner.region()));
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    async fn cached(&self, key: &str) -> Option<Vec<Entity>> {
        let cache = self.cache.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.read::<Vec<Entity>>(&key))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Cache read task failed");
                None
            })
    }

    async fn store(&self, key: &str, items: &[Entity]) {
        let cache = self.cache.clone();
        let key = key.to_string();
        let items = items.to_vec();
        let result = tokio::task::spawn_blocking(move || cache.write(&key, &items)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                account_id = %self.inner.account_id(),
                region = %self.inner.region(),
                error = %e,
                "Failed to write fetched resources to cache"
            ),
            Err(e) => warn!(error = %e, "Cache write task failed"),
        }
    }
}

impl<G: Gateway> Gateway for CachedGateway<G> {
    fn account_id(&self) -> &AccountId {
        self.inner.account_id()
    }

    fn region(&self) -> &Region {
        self.inner.region()
    }

    async fn find_all(&self, resource_type: &ResourceType) -> Result<Vec<Entity>, GatewayError> {
        let key = resource_type.canonical_name();

        if let Some(items) = self.cached(&key).await {
            debug!(
                namespace = %self.cache.namespace(),
                resource_type = %resource_type,
                count = items.len(),
                "Serving resources from cache"
            );
            return Ok(items);
        }

        let items = self.inner.find_all(resource_type).await?;
        self.store(&key, &items).await;
        Ok(items)
    }
}
