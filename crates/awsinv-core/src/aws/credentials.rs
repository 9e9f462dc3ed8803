//! Assumable-role discovery
//!
//! The caller's own role is inspected for attached managed policies granting
//! `sts:AssumeRole`; every role ARN those statements name becomes a candidate
//! for cross-account assumption, keyed by the account it lives in.

use super::account::{CallerIdentity, get_caller_identity};
use super::context::AwsContext;
use super::iam::IamClient;
use super::policy::{self, PolicyError};
use awsinv_common::metrics::{labels, names};
use awsinv_common::{AccountId, Arn, ArnError, RoleArn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Account → assumable role mapping
pub type RoleMap = HashMap<AccountId, RoleArn>;

/// Failures that prevent role discovery
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to resolve caller identity: {0:#}")]
    Identity(anyhow::Error),

    #[error("caller ARN is not parseable: {0}")]
    CallerArn(#[from] ArnError),

    #[error("invalid role ARN format: {0}")]
    InvalidRoleArnFormat(String),

    #[error("failed to read policies attached to role {role}: {source:#}")]
    Policies {
        role: String,
        source: anyhow::Error,
    },

    #[error("attached policy document for role {role} is unreadable: {source}")]
    Document { role: String, source: PolicyError },
}

/// Identity and policy lookups needed by [`CredentialResolver`]
pub trait IdentitySource: Send + Sync {
    /// Identity of the default credential chain
    fn caller_identity(&self) -> impl Future<Output = anyhow::Result<CallerIdentity>> + Send;

    /// Raw (URL-encoded) default-version documents of every policy attached to `role_name`
    fn attached_policy_documents(
        &self,
        role_name: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;
}

/// [`IdentitySource`] backed by STS and IAM
pub struct AwsIdentitySource {
    ctx: AwsContext,
    iam: IamClient,
}

impl AwsIdentitySource {
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            ctx: ctx.clone(),
            iam: IamClient::from_context(ctx),
        }
    }
}

impl IdentitySource for AwsIdentitySource {
    async fn caller_identity(&self) -> anyhow::Result<CallerIdentity> {
        get_caller_identity(&self.ctx).await
    }

    async fn attached_policy_documents(&self, role_name: &str) -> anyhow::Result<Vec<String>> {
        self.iam.attached_policy_documents(role_name).await
    }
}

/// Role name from a caller ARN resource such as `role/<name>` or
/// `assumed-role/<name>/<session>`.
pub fn role_name_from_arn(arn: &Arn) -> Result<&str, ResolutionError> {
    arn.resource
        .split('/')
        .nth(1)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ResolutionError::InvalidRoleArnFormat(arn.to_string()))
}

/// Discovers and memoizes the accounts the caller may assume into
pub struct CredentialResolver<S> {
    source: S,
    roles: Mutex<Option<Arc<RoleMap>>>,
}

impl<S: IdentitySource> CredentialResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            roles: Mutex::new(None),
        }
    }

    /// The assumable-role map, computed on first call.
    ///
    /// Concurrent first calls may each hit the network; whichever finishes
    /// first is kept.
    pub async fn discover_assumable_roles(&self) -> Result<Arc<RoleMap>, ResolutionError> {
        if let Some(roles) = self.roles.lock().as_ref() {
            return Ok(Arc::clone(roles));
        }

        let discovered = Arc::new(self.discover().await?);

        let mut slot = self.roles.lock();
        Ok(Arc::clone(slot.get_or_insert(discovered)))
    }

    async fn discover(&self) -> Result<RoleMap, ResolutionError> {
        let identity = self
            .source
            .caller_identity()
            .await
            .map_err(ResolutionError::Identity)?;

        let caller_arn: Arn = identity.arn.parse()?;
        let role_name = role_name_from_arn(&caller_arn)?;

        debug!(caller = %caller_arn, role = %role_name, "Reading attached policies for assumable roles");

        let documents = self
            .source
            .attached_policy_documents(role_name)
            .await
            .map_err(|source| ResolutionError::Policies {
                role: role_name.to_string(),
                source,
            })?;

        let mut roles = RoleMap::new();
        for raw in documents {
            let document =
                policy::decode_policy_document(&raw).map_err(|source| ResolutionError::Document {
                    role: role_name.to_string(),
                    source,
                })?;

            for candidate in policy::assumable_role_arns(&document) {
                let arn: Arn = match candidate.parse() {
                    Ok(arn) => arn,
                    Err(e) => {
                        warn!(resource = %candidate, error = %e, "Skipping non-ARN assume-role resource");
                        continue;
                    }
                };

                let account = arn.account();
                let role = RoleArn::new(candidate);
                if let Some(previous) = roles.insert(account.clone(), role.clone()) {
                    if previous != role {
                        warn!(
                            account_id = %account,
                            previous = %previous,
                            replacement = %role,
                            "Multiple assumable roles for one account, keeping the later one"
                        );
                        metrics::counter!(names::ROLE_OVERWRITE, labels::ACCOUNT_ID => account.to_string())
                            .increment(1);
                    }
                }
            }
        }

        info!(
            account_id = %identity.account_id,
            accounts = roles.len(),
            "Discovered assumable roles"
        );
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeIdentitySource;

    fn doc(json: &str) -> String {
        urlencoding::encode(json).into_owned()
    }

    #[test]
    fn role_name_extraction() {
        let arn: Arn = "arn:aws:iam::1:role/reader".parse().unwrap();
        assert_eq!(role_name_from_arn(&arn).unwrap(), "reader");

        let arn: Arn = "arn:aws:sts::1:assumed-role/reader/session".parse().unwrap();
        assert_eq!(role_name_from_arn(&arn).unwrap(), "reader");

        let arn: Arn = "arn:aws:iam::1:root".parse().unwrap();
        assert!(matches!(
            role_name_from_arn(&arn),
            Err(ResolutionError::InvalidRoleArnFormat(_))
        ));
    }

    #[tokio::test]
    async fn maps_roles_by_account() {
        let source = FakeIdentitySource::new("arn:aws:sts::9:assumed-role/inventory/s")
            .with_document(doc(
                r#"{"Statement":[{"Effect":"Allow","Action":"sts:AssumeRole","Resource":["arn:aws:iam::1:role/x","arn:aws:iam::2:role/y"]}]}"#,
            ))
            .with_document(doc(
                r#"{"Statement":{"Effect":"Allow","Action":"sts:AssumeRole","Resource":"arn:aws:iam::3:role/z"}}"#,
            ));
        let resolver = CredentialResolver::new(source);

        let roles = resolver.discover_assumable_roles().await.unwrap();
        assert_eq!(roles.len(), 3);
        assert_eq!(roles[&AccountId::from("2")], RoleArn::new("arn:aws:iam::2:role/y"));
        assert_eq!(resolver.source.requested_roles(), ["inventory"]);
    }

    #[tokio::test]
    async fn later_role_overwrites_earlier() {
        let source = FakeIdentitySource::new("arn:aws:iam::9:role/inventory").with_document(doc(
            r#"{"Statement":[{"Action":"sts:AssumeRole","Resource":["arn:aws:iam::1:role/first","arn:aws:iam::1:role/second"]}]}"#,
        ));
        let roles = CredentialResolver::new(source)
            .discover_assumable_roles()
            .await
            .unwrap();
        assert_eq!(roles[&AccountId::from("1")], RoleArn::new("arn:aws:iam::1:role/second"));
    }

    #[tokio::test]
    async fn result_is_memoized() {
        let source = FakeIdentitySource::new("arn:aws:iam::9:role/inventory").with_document(doc(
            r#"{"Statement":[{"Action":"sts:AssumeRole","Resource":"arn:aws:iam::1:role/x"}]}"#,
        ));
        let resolver = CredentialResolver::new(source);

        let first = resolver.discover_assumable_roles().await.unwrap();
        let second = resolver.discover_assumable_roles().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.source.identity_calls(), 1);
    }

    #[tokio::test]
    async fn non_role_caller_fails() {
        let resolver = CredentialResolver::new(FakeIdentitySource::new("arn:aws:iam::9:root"));
        assert!(matches!(
            resolver.discover_assumable_roles().await,
            Err(ResolutionError::InvalidRoleArnFormat(_))
        ));
    }

    #[tokio::test]
    async fn identity_failure_is_fatal() {
        let resolver = CredentialResolver::new(FakeIdentitySource::failing());
        assert!(matches!(
            resolver.discover_assumable_roles().await,
            Err(ResolutionError::Identity(_))
        ));
    }

    #[tokio::test]
    async fn wildcard_resources_are_skipped() {
        let source = FakeIdentitySource::new("arn:aws:iam::9:role/inventory").with_document(doc(
            r#"{"Statement":[{"Action":"sts:AssumeRole","Resource":["*","arn:aws:iam::4:role/w"]}]}"#,
        ));
        let roles = CredentialResolver::new(source)
            .discover_assumable_roles()
            .await
            .unwrap();
        assert_eq!(roles.keys().collect::<Vec<_>>(), [&AccountId::from("4")]);
    }
}
