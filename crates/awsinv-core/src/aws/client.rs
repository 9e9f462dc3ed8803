//! Per-(account, region) client handle

use super::account::{CallerIdentity, get_caller_identity};
use super::context::AwsContext;
use anyhow::Result;
use awsinv_common::{AccountId, Region};
use tokio::sync::OnceCell;

/// Configured SDK context bound to one account and region
///
/// The account is either known up front (from the assumable-role map) or
/// resolved with STS on first use and kept for the handle's lifetime.
pub struct ClientHandle {
    ctx: AwsContext,
    region: Region,
    account_hint: Option<AccountId>,
    identity: OnceCell<CallerIdentity>,
}

impl ClientHandle {
    pub fn new(ctx: AwsContext) -> Self {
        let region = Region::from(ctx.region());
        Self {
            ctx,
            region,
            account_hint: None,
            identity: OnceCell::new(),
        }
    }

    /// Preset the account instead of resolving it lazily.
    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_hint = Some(account_id);
        self
    }

    /// Seed the identity cell, e.g. after a verification call.
    pub fn with_identity(mut self, identity: Option<CallerIdentity>) -> Self {
        self.identity = OnceCell::new_with(identity);
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn context(&self) -> &AwsContext {
        &self.ctx
    }

    /// Identity behind this handle's credentials, resolved once.
    pub async fn caller_identity(&self) -> Result<&CallerIdentity> {
        self.identity
            .get_or_try_init(|| get_caller_identity(&self.ctx))
            .await
    }

    pub async fn account_id(&self) -> Result<AccountId> {
        if let Some(account) = &self.account_hint {
            return Ok(account.clone());
        }
        Ok(self.caller_identity().await?.account_id.clone())
    }

    pub fn ec2(&self) -> aws_sdk_ec2::Client {
        self.ctx.ec2_client()
    }

    pub fn s3(&self) -> aws_sdk_s3::Client {
        self.ctx.s3_client()
    }

    pub fn iam(&self) -> aws_sdk_iam::Client {
        self.ctx.iam_client()
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("region", &self.region)
            .field("account_id", &self.account_hint)
            .finish_non_exhaustive()
    }
}
