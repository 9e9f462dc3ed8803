//! In-process fakes for unit tests

use crate::aws::account::CallerIdentity;
use crate::aws::builder::ClientBuilder;
use crate::aws::client::ClientHandle;
use crate::aws::context::AwsContext;
use crate::aws::credentials::IdentitySource;
use crate::gateway::{Gateway, GatewayError};
use anyhow::{Result, anyhow};
use aws_config::{BehaviorVersion, Region as SdkRegion, SdkConfig};
use awsinv_common::{AccountId, Arn, Entity, Region, ResourceType, RoleArn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Context with no credentials; building clients works, calling them does not.
pub fn offline_context(region: &str) -> AwsContext {
    AwsContext::from_sdk_config(
        SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(SdkRegion::new(region.to_string()))
            .build(),
    )
}

/// URL-encoded policy granting `sts:AssumeRole` on `roles`.
pub fn assume_role_document(roles: &[&str]) -> String {
    let doc = serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": "sts:AssumeRole",
            "Resource": roles,
        }]
    });
    urlencoding::encode(&doc.to_string()).into_owned()
}

pub struct FakeIdentitySource {
    caller_arn: Option<String>,
    documents: Vec<String>,
    requested: Mutex<Vec<String>>,
    identity_calls: AtomicUsize,
}

impl FakeIdentitySource {
    pub fn new(caller_arn: &str) -> Self {
        Self {
            caller_arn: Some(caller_arn.to_string()),
            documents: Vec::new(),
            requested: Mutex::new(Vec::new()),
            identity_calls: AtomicUsize::new(0),
        }
    }

    /// Source whose identity lookup always fails.
    pub fn failing() -> Self {
        Self {
            caller_arn: None,
            ..Self::new("")
        }
    }

    pub fn with_document(mut self, raw: String) -> Self {
        self.documents.push(raw);
        self
    }

    pub fn requested_roles(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }
}

impl IdentitySource for FakeIdentitySource {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        let arn = self
            .caller_arn
            .clone()
            .ok_or_else(|| anyhow!("ExpiredToken: credentials expired"))?;
        let account_id = arn
            .parse::<Arn>()
            .map(|a| a.account())
            .unwrap_or_else(|_| AccountId::from("0"));
        Ok(CallerIdentity {
            account_id,
            arn,
            user_id: "AIDAFAKE".to_string(),
        })
    }

    async fn attached_policy_documents(&self, role_name: &str) -> Result<Vec<String>> {
        self.requested.lock().push(role_name.to_string());
        Ok(self.documents.clone())
    }
}

#[derive(Default)]
pub struct FakeClientBuilder {
    failing_regions: HashSet<String>,
    assume_calls: AtomicUsize,
    local_calls: AtomicUsize,
}

impl FakeClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every client requested for `region` fails to build.
    pub fn failing_region(mut self, region: &str) -> Self {
        self.failing_regions.insert(region.to_string());
        self
    }

    pub fn assume_calls(&self) -> usize {
        self.assume_calls.load(Ordering::SeqCst)
    }

    pub fn local_calls(&self) -> usize {
        self.local_calls.load(Ordering::SeqCst)
    }

    fn check(&self, region: &Region) -> Result<()> {
        if self.failing_regions.contains(region.as_str()) {
            return Err(anyhow!("OptInRequired: region {region} is not enabled"));
        }
        Ok(())
    }
}

impl ClientBuilder for FakeClientBuilder {
    async fn assume_client(
        &self,
        _role: &RoleArn,
        account_id: &AccountId,
        region: &Region,
    ) -> Result<ClientHandle> {
        self.assume_calls.fetch_add(1, Ordering::SeqCst);
        self.check(region)?;
        Ok(ClientHandle::new(offline_context(region.as_str())).with_account(account_id.clone()))
    }

    async fn local_client(&self, region: &Region) -> Result<ClientHandle> {
        self.local_calls.fetch_add(1, Ordering::SeqCst);
        self.check(region)?;
        Ok(ClientHandle::new(offline_context(region.as_str())).with_account(AccountId::from("0")))
    }
}

/// Gateway serving a fixed entity list, filtered by resource type
pub struct FakeGateway {
    account_id: AccountId,
    region: Region,
    entities: Vec<Entity>,
    error: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(account_id: &str, region: &str) -> Self {
        Self {
            account_id: AccountId::from(account_id),
            region: Region::from(region),
            entities: Vec::new(),
            error: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.error {
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
