//! IAM reads needed for assumable-role discovery

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use tracing::debug;

/// IAM client for reading a role's attached managed policies
pub struct IamClient {
    client: Client,
}

impl IamClient {
    /// Create an IAM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// ARNs of the managed policies attached to `role_name`
    pub async fn list_attached_role_policy_arns(&self, role_name: &str) -> Result<Vec<String>> {
        let mut arns = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_attached_role_policies().role_name(role_name);
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list policies attached to role {role_name}"))?;

            arns.extend(
                response
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn().map(str::to_string)),
            );

            // Handle pagination
            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(role = %role_name, count = arns.len(), "Found attached role policies");
        Ok(arns)
    }

    /// URL-encoded document of the policy's default version
    pub async fn default_policy_document(&self, policy_arn: &str) -> Result<String> {
        let policy = self
            .client
            .get_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .with_context(|| format!("Failed to get policy {policy_arn}"))?;

        let version_id = policy
            .policy()
            .and_then(|p| p.default_version_id())
            .with_context(|| format!("Policy {policy_arn} has no default version"))?;

        let version = self
            .client
            .get_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .with_context(|| format!("Failed to get version {version_id} of policy {policy_arn}"))?;

        version
            .policy_version()
            .and_then(|v| v.document())
            .map(str::to_string)
            .with_context(|| format!("Policy {policy_arn} version {version_id} has no document"))
    }

    /// Default-version documents of every policy attached to `role_name`
    pub async fn attached_policy_documents(&self, role_name: &str) -> Result<Vec<String>> {
        let mut documents = Vec::new();
        for arn in self.list_attached_role_policy_arns(role_name).await? {
            documents.push(self.default_policy_document(&arn).await?);
        }
        Ok(documents)
    }
}
