//! S3 bucket adapter
//!
//! Buckets are listed once per account. The entity region is the bucket's own
//! region when S3 reports it, otherwise the region of the listing client.

use super::{Scope, aws_error, extract_tags, to_chrono};
use crate::gateway::GatewayError;
use aws_sdk_s3::Client;
use awsinv_common::payload::{self, Payload};
use awsinv_common::{Entity, Region, ResourceType};
use std::collections::HashMap;
use tracing::{debug, trace};

fn extract_s3_tags(tags: &[aws_sdk_s3::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| Some(t.key()), |t| Some(t.value()))
}

pub struct S3Repository {
    client: Client,
    scope: Scope,
}

impl S3Repository {
    pub fn new(client: Client, scope: Scope) -> Self {
        Self { client, scope }
    }

    /// Bucket tags; buckets without a tag set (or in another region) yield none.
    async fn bucket_tags(&self, bucket: &str) -> HashMap<String, String> {
        match self.client.get_bucket_tagging().bucket(bucket).send().await {
            Ok(resp) => extract_s3_tags(resp.tag_set()),
            Err(e) => {
                debug!(bucket = %bucket, error = %aws_sdk_s3::error::DisplayErrorContext(&e), "No readable bucket tags");
                HashMap::new()
            }
        }
    }

    pub async fn list_buckets_all(&self) -> Result<Vec<Entity>, GatewayError> {
        self.scope.checkpoint(&ResourceType::S3_BUCKET)?;
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(aws_error("ListBuckets"))?;

        let mut items = Vec::new();
        for bucket in response.buckets() {
            let Some(name) = bucket.name() else {
                continue;
            };
            self.scope.checkpoint(&ResourceType::S3_BUCKET)?;

            let bucket_region = bucket.bucket_region().map(str::to_string);
            let region = bucket_region
                .as_deref()
                .map(Region::from)
                .unwrap_or_else(|| self.scope.region.clone());

            items.push(
                Entity::new(self.scope.account_id.clone(), region, ResourceType::S3_BUCKET, name)
                    .with_arn(format!("arn:aws:s3:::{name}"))
                    .with_name(name)
                    .with_created_at(to_chrono(bucket.creation_date()))
                    .with_tags(self.bucket_tags(name).await)
                    .with_payload(Payload::S3Bucket(payload::S3Bucket { bucket_region })),
            );
        }

        trace!(count = items.len(), account_id = %self.scope.account_id, "Listed S3 buckets");
        Ok(items)
    }
}
