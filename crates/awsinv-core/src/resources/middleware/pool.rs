//! Middleware that keeps the latest resources per type and publishes counts

use crate::resources::observer::{Handler, Middleware};
use crate::resources::reader::ResourceReader;
use awsinv_common::metrics::{labels, names};
use awsinv_common::{AccountId, Entity, Region, ResourceType};
use futures::FutureExt;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Counts = BTreeMap<(AccountId, Region), usize>;

#[derive(Default)]
struct PoolState {
    resources: HashMap<ResourceType, Vec<Entity>>,
    counts: HashMap<ResourceType, Counts>,
}

/// Keeps the latest entity list per resource type
///
/// Clones share storage, so a clone kept outside the observer sees what the
/// chain recorded. Each update also publishes a per-(account, region) gauge,
/// resetting pairs that disappeared since the previous update to zero.
#[derive(Clone, Default)]
pub struct ResourcePoolMiddleware {
    state: Arc<RwLock<PoolState>>,
}

impl ResourcePoolMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored entity across resource types.
    pub fn get_resources(&self) -> Vec<Entity> {
        let state = self.state.read();
        let mut types: Vec<_> = state.resources.keys().collect();
        types.sort();
        types
            .into_iter()
            .flat_map(|t| state.resources[t].iter().cloned())
            .collect()
    }

    pub fn get_resources_by_type(&self, resource_type: &ResourceType) -> Vec<Entity> {
        self.state
            .read()
            .resources
            .get(resource_type)
            .cloned()
            .unwrap_or_default()
    }

    fn store(&self, resource_type: &ResourceType, items: Vec<Entity>) {
        let mut counts = Counts::new();
        for entity in &items {
            *counts
                .entry((entity.account_id.clone(), entity.region.clone()))
                .or_default() += 1;
        }

        let mut state = self.state.write();
        if let Some(previous) = state.counts.get(resource_type) {
            for pair in previous.keys().filter(|pair| !counts.contains_key(*pair)) {
                publish(resource_type, pair, 0);
            }
        }
        for (pair, count) in &counts {
            publish(resource_type, pair, *count);
        }

        state.counts.insert(resource_type.clone(), counts);
        state.resources.insert(resource_type.clone(), items);
    }
}

fn publish(resource_type: &ResourceType, (account_id, region): &(AccountId, Region), count: usize) {
    metrics::gauge!(
        names::RESOURCES,
        labels::RESOURCE_TYPE => resource_type.to_string(),
        labels::ACCOUNT_ID => account_id.to_string(),
        labels::REGION => region.to_string()
    )
    .set(count as f64);
}

impl Middleware for ResourcePoolMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let pool = self.clone();
        Arc::new(move |reader: Arc<ResourceReader>| {
            let pool = pool.clone();
            let next = Arc::clone(&next);
            async move {
                let items = reader.read().await;
                pool.store(reader.resource_type(), items);
                next(reader).await
            }
            .boxed()
        })
    }
}

impl std::fmt::Debug for ResourcePoolMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ResourcePoolMiddleware")
            .field("types", &state.resources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::null_handler;
    use awsinv_test_utils::entities;
    use tokio::sync::mpsc;

    async fn feed(pool: &ResourcePoolMiddleware, resource_type: ResourceType, items: Vec<Entity>) {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for e in items {
            tx.send(e).await.unwrap();
        }
        drop(tx);
        let reader = Arc::new(ResourceReader::new(resource_type, rx));
        pool.wrap(null_handler())(reader).await.unwrap();
    }

    #[tokio::test]
    async fn stores_latest_per_type() {
        let pool = ResourcePoolMiddleware::new();
        feed(
            &pool,
            ResourceType::EC2_VPC,
            entities("1", "eu-west-1", ResourceType::EC2_VPC, "old", 3),
        )
        .await;
        feed(
            &pool,
            ResourceType::EC2_VPC,
            entities("1", "eu-west-1", ResourceType::EC2_VPC, "new", 1),
        )
        .await;
        feed(
            &pool,
            ResourceType::IAM_USER,
            entities("1", "eu-central-1", ResourceType::IAM_USER, "u", 2),
        )
        .await;

        let vpcs = pool.get_resources_by_type(&ResourceType::EC2_VPC);
        assert_eq!(vpcs.len(), 1);
        assert_eq!(vpcs[0].id, "new-0");
        assert_eq!(pool.get_resources().len(), 3);
        assert!(pool.get_resources_by_type(&ResourceType::S3_BUCKET).is_empty());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let pool = ResourcePoolMiddleware::new();
        let observer_copy = pool.clone();
        feed(
            &observer_copy,
            ResourceType::EC2_VPC,
            entities("1", "eu-west-1", ResourceType::EC2_VPC, "v", 2),
        )
        .await;
        assert_eq!(pool.get_resources().len(), 2);
    }

    #[tokio::test]
    async fn tracks_counts_per_pair() {
        let pool = ResourcePoolMiddleware::new();
        let mut items = entities("1", "eu-west-1", ResourceType::EC2_VPC, "a", 2);
        items.extend(entities("2", "us-east-1", ResourceType::EC2_VPC, "b", 1));
        feed(&pool, ResourceType::EC2_VPC, items).await;
        feed(
            &pool,
            ResourceType::EC2_VPC,
            entities("2", "us-east-1", ResourceType::EC2_VPC, "b", 4),
        )
        .await;

        let state = pool.state.read();
        let counts = &state.counts[&ResourceType::EC2_VPC];
        assert_eq!(counts.len(), 1);
        assert_eq!(
            counts[&(AccountId::from("2"), Region::from("us-east-1"))],
            4
        );
    }
}
