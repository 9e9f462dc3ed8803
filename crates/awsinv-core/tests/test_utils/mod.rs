//! Shared fakes for offline integration tests

#![allow(dead_code)]

use anyhow::anyhow;
use awsinv_common::{AccountId, Entity, Region, ResourceType};
use awsinv_core::gateway::{Gateway, GatewayError, GatewayPool};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Gateway serving fixed entities, with per-type call counts
pub struct FakeGateway {
    account_id: AccountId,
    region: Region,
    entities: Vec<Entity>,
    failing: Option<String>,
    delay: Duration,
    calls: Mutex<HashMap<ResourceType, usize>>,
}

impl FakeGateway {
    pub fn new(account_id: &str, region: &str) -> Self {
        Self {
            account_id: AccountId::from(account_id),
            region: Region::from(region),
            entities: Vec::new(),
            failing: None,
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities.extend(entities);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failing = Some(message.to_string());
        self
    }

    pub fn calls_for(&self, resource_type: &ResourceType) -> usize {
        self.calls.lock().get(resource_type).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

impl Gateway for FakeGateway {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn region(&self) -> &Region {
        &self.region
    }

    async fn find_all(&self, resource_type: &ResourceType) -> Result<Vec<Entity>, GatewayError> {
        *self.calls.lock().entry(resource_type.clone()).or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.failing {
            return Err(GatewayError::Other(anyhow!("{message}")));
        }

        Ok(self
            .entities
            .iter()
            .filter(|e| &e.resource_type == resource_type)
            .cloned()
            .collect())
    }
}

/// Pool with one empty gateway per (account, region).
pub fn empty_pool(pairs: &[(&str, &str)]) -> GatewayPool<FakeGateway> {
    GatewayPool::new(pairs.iter().map(|(a, r)| FakeGateway::new(a, r)))
}
