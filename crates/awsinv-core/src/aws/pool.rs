//! Lazily-built client handles per (account, region)

use super::builder::{AwsClientBuilder, ClientBuilder};
use super::client::ClientHandle;
use super::credentials::{AwsIdentitySource, CredentialResolver, IdentitySource, ResolutionError};
use awsinv_common::{AccountId, Region, RoleArn};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no assumable role found for account {0}")]
    RoleNotFound(AccountId),

    #[error("failed to initialize client for account {account_id} in {region}: {source:#}")]
    ClientInit {
        account_id: String,
        region: Region,
        source: anyhow::Error,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Memoized cross-account client handles
///
/// Roles are discovered once through the [`CredentialResolver`]; each
/// (account, region) handle is built on first request and reused afterwards.
pub struct ClientPool<B, S> {
    builder: B,
    resolver: CredentialResolver<S>,
    clients: Mutex<HashMap<(AccountId, Region), Arc<ClientHandle>>>,
}

/// Pool over real AWS credentials
pub type AwsClientPool = ClientPool<AwsClientBuilder, AwsIdentitySource>;

impl AwsClientPool {
    /// Pool using the default credential chain for discovery.
    pub async fn from_env() -> Self {
        let builder = AwsClientBuilder::new().await;
        let source = builder.identity_source();
        ClientPool::new(builder, source)
    }
}

impl<B: ClientBuilder, S: IdentitySource> ClientPool<B, S> {
    pub fn new(builder: B, source: S) -> Self {
        Self {
            builder,
            resolver: CredentialResolver::new(source),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Memoized handle for the pair, assuming the account's role on first use.
    pub async fn get_client(
        &self,
        account_id: &AccountId,
        region: &Region,
    ) -> Result<Arc<ClientHandle>, PoolError> {
        let key = (account_id.clone(), region.clone());
        if let Some(handle) = self.clients.lock().get(&key) {
            return Ok(Arc::clone(handle));
        }

        let roles = self.resolver.discover_assumable_roles().await?;
        let role = roles
            .get(account_id)
            .ok_or_else(|| PoolError::RoleNotFound(account_id.clone()))?;

        let handle = self
            .builder
            .assume_client(role, account_id, region)
            .await
            .map_err(|source| PoolError::ClientInit {
                account_id: account_id.to_string(),
                region: region.clone(),
                source,
            })?;

        debug!(account_id = %account_id, region = %region, "Built client");

        // A concurrent build for the same pair may have landed first; keep it.
        let mut clients = self.clients.lock();
        Ok(Arc::clone(
            clients.entry(key).or_insert_with(|| Arc::new(handle)),
        ))
    }

    /// Handles for every discovered account in every requested region.
    ///
    /// Pairs that fail to initialize are logged and skipped; only role
    /// discovery failures fail the call.
    pub async fn get_clients(&self, regions: &[Region]) -> Result<Vec<Arc<ClientHandle>>, PoolError> {
        let roles = self.resolver.discover_assumable_roles().await?;

        let mut accounts: Vec<&AccountId> = roles.keys().collect();
        accounts.sort();

        let attempts = accounts
            .into_iter()
            .flat_map(|account| regions.iter().map(move |region| (account, region)))
            .map(|(account, region)| async move {
                match self.get_client(account, region).await {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!(
                            account_id = %account,
                            region = %region,
                            error = %e,
                            "Failed to init client, IAM role access issue or region not enabled. Skipping"
                        );
                        None
                    }
                }
            });

        Ok(join_all(attempts).await.into_iter().flatten().collect())
    }

    pub async fn list_account_ids(&self) -> Result<Vec<AccountId>, PoolError> {
        let roles = self.resolver.discover_assumable_roles().await?;
        let mut ids: Vec<AccountId> = roles.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub async fn list_assumable_role_arns(&self) -> Result<Vec<RoleArn>, PoolError> {
        let roles = self.resolver.discover_assumable_roles().await?;
        let mut arns: Vec<RoleArn> = roles.values().cloned().collect();
        arns.sort();
        Ok(arns)
    }
}

/// Client handles over the default credential chain, one per region
///
/// Used when the caller's own account is the only one to inventory.
pub struct LocalClientPool<B> {
    builder: B,
    clients: Mutex<HashMap<Region, Arc<ClientHandle>>>,
}

impl LocalClientPool<AwsClientBuilder> {
    pub async fn from_env() -> Self {
        LocalClientPool::new(AwsClientBuilder::new().await)
    }
}

impl<B: ClientBuilder> LocalClientPool<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_client(&self, region: &Region) -> anyhow::Result<Arc<ClientHandle>> {
        if let Some(handle) = self.clients.lock().get(region) {
            return Ok(Arc::clone(handle));
        }

        let handle = self.builder.local_client(region).await?;

        let mut clients = self.clients.lock();
        Ok(Arc::clone(
            clients
                .entry(region.clone())
                .or_insert_with(|| Arc::new(handle)),
        ))
    }

    /// Handles for each region; failures are logged and skipped.
    pub async fn get_clients(&self, regions: &[Region]) -> Vec<Arc<ClientHandle>> {
        let attempts = regions.iter().map(|region| async move {
            match self.get_client(region).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(region = %region, error = %e, "Failed to init local client. Skipping");
                    None
                }
            }
        });

        join_all(attempts).await.into_iter().flatten().collect()
    }
}
