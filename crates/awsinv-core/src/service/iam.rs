//! IAM user adapter

use super::{Scope, aws_error, to_chrono};
use crate::gateway::GatewayError;
use aws_sdk_iam::Client;
use awsinv_common::payload::{self, Payload};
use awsinv_common::{Entity, ResourceType};
use tracing::trace;

pub struct IamRepository {
    client: Client,
    scope: Scope,
}

impl IamRepository {
    pub fn new(client: Client, scope: Scope) -> Self {
        Self { client, scope }
    }

    /// Every user in the account.
    ///
    /// ListUsers does not return tags, so user entities carry none.
    pub async fn list_users_all(&self) -> Result<Vec<Entity>, GatewayError> {
        let mut items = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            self.scope.checkpoint(&ResourceType::IAM_USER)?;
            let mut request = self.client.list_users();
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request.send().await.map_err(aws_error("ListUsers"))?;

            for user in response.users() {
                items.push(
                    Entity::new(
                        self.scope.account_id.clone(),
                        self.scope.region.clone(),
                        ResourceType::IAM_USER,
                        user.user_id(),
                    )
                    .with_arn(user.arn())
                    .with_name(user.user_name())
                    .with_created_at(to_chrono(Some(user.create_date())))
                    .with_payload(Payload::IamUser(payload::IamUser {
                        user_id: user.user_id().to_string(),
                        path: user.path().to_string(),
                        password_last_used: to_chrono(user.password_last_used()),
                    })),
                );
            }

            // Handle pagination
            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        trace!(count = items.len(), account_id = %self.scope.account_id, "Listed IAM users");
        Ok(items)
    }
}
