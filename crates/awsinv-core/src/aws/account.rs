//! Caller identity lookup via STS

use super::context::AwsContext;
use anyhow::{Context, Result};
use awsinv_common::AccountId;
use tracing::debug;

/// Identity of the credentials behind a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: AccountId,
    pub arn: String,
    pub user_id: String,
}

/// Fetch the caller identity via STS GetCallerIdentity
///
/// This operation requires no special permissions. It always succeeds if
/// credentials are valid for the context's region.
pub async fn get_caller_identity(ctx: &AwsContext) -> Result<CallerIdentity> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;
    let arn = identity
        .arn()
        .context("No ARN returned from STS GetCallerIdentity")?;

    debug!(account_id = %account, arn = %arn, region = %ctx.region(), "Resolved caller identity");

    Ok(CallerIdentity {
        account_id: AccountId::from(account),
        arn: arn.to_string(),
        user_id: identity.user_id().unwrap_or_default().to_string(),
    })
}
