//! EC2 adapters: instances, volumes, VPCs and owned snapshots

use super::{Scope, aws_error, extract_tags, to_chrono};
use crate::gateway::GatewayError;
use aws_sdk_ec2::Client;
use awsinv_common::payload::{self, Payload};
use awsinv_common::{Entity, ResourceType, build_arn};
use std::collections::HashMap;
use tracing::trace;

fn extract_ec2_tags(tags: &[aws_sdk_ec2::types::Tag]) -> HashMap<String, String> {
    extract_tags(tags, |t| t.key(), |t| t.value())
}

pub struct Ec2Repository {
    client: Client,
    scope: Scope,
}

impl Ec2Repository {
    pub fn new(client: Client, scope: Scope) -> Self {
        Self { client, scope }
    }

    fn entity(&self, resource_type: ResourceType, arn_prefix: &str, id: &str) -> Entity {
        let arn = build_arn(&self.scope.account_id, &self.scope.region, "ec2", arn_prefix, id);
        Entity::new(
            self.scope.account_id.clone(),
            self.scope.region.clone(),
            resource_type,
            id,
        )
        .with_arn(arn)
    }

    pub async fn list_instances_all(&self) -> Result<Vec<Entity>, GatewayError> {
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            self.scope.checkpoint(&ResourceType::EC2_INSTANCE)?;
            let response = self
                .client
                .describe_instances()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(aws_error("DescribeInstances"))?;

            for instance in response.reservations().iter().flat_map(|r| r.instances()) {
                let Some(id) = instance.instance_id() else {
                    continue;
                };

                items.push(
                    self.entity(ResourceType::EC2_INSTANCE, "instance/", id)
                        .with_created_at(to_chrono(instance.launch_time()))
                        .with_tags(extract_ec2_tags(instance.tags()))
                        .with_payload(Payload::Ec2Instance(payload::Ec2Instance {
                            instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
                            state: instance
                                .state()
                                .and_then(|s| s.name())
                                .map(|n| n.as_str().to_string()),
                            private_ip_address: instance.private_ip_address().map(str::to_string),
                            vpc_id: instance.vpc_id().map(str::to_string),
                            availability_zone: instance
                                .placement()
                                .and_then(|p| p.availability_zone())
                                .map(str::to_string),
                        })),
                );
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        trace!(count = items.len(), region = %self.scope.region, "Listed EC2 instances");
        Ok(items)
    }

    pub async fn list_volumes_all(&self) -> Result<Vec<Entity>, GatewayError> {
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            self.scope.checkpoint(&ResourceType::EC2_VOLUME)?;
            let response = self
                .client
                .describe_volumes()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(aws_error("DescribeVolumes"))?;

            for volume in response.volumes() {
                let Some(id) = volume.volume_id() else {
                    continue;
                };

                items.push(
                    self.entity(ResourceType::EC2_VOLUME, "volume/", id)
                        .with_created_at(to_chrono(volume.create_time()))
                        .with_tags(extract_ec2_tags(volume.tags()))
                        .with_payload(Payload::Ec2Volume(payload::Ec2Volume {
                            volume_type: volume.volume_type().map(|t| t.as_str().to_string()),
                            size_gib: volume.size(),
                            state: volume.state().map(|s| s.as_str().to_string()),
                            encrypted: volume.encrypted(),
                            attached_instances: volume
                                .attachments()
                                .iter()
                                .filter_map(|a| a.instance_id().map(str::to_string))
                                .collect(),
                        })),
                );
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        trace!(count = items.len(), region = %self.scope.region, "Listed EBS volumes");
        Ok(items)
    }

    /// VPCs carry no creation time; their entities report the epoch.
    pub async fn list_vpcs_all(&self) -> Result<Vec<Entity>, GatewayError> {
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            self.scope.checkpoint(&ResourceType::EC2_VPC)?;
            let response = self
                .client
                .describe_vpcs()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(aws_error("DescribeVpcs"))?;

            for vpc in response.vpcs() {
                let Some(id) = vpc.vpc_id() else {
                    continue;
                };

                items.push(
                    self.entity(ResourceType::EC2_VPC, "vpc/", id)
                        .with_tags(extract_ec2_tags(vpc.tags()))
                        .with_payload(Payload::Ec2Vpc(payload::Ec2Vpc {
                            cidr_block: vpc.cidr_block().map(str::to_string),
                            is_default: vpc.is_default().unwrap_or(false),
                            state: vpc.state().map(|s| s.as_str().to_string()),
                        })),
                );
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        trace!(count = items.len(), region = %self.scope.region, "Listed VPCs");
        Ok(items)
    }

    /// Snapshots owned by the account; public and shared snapshots are skipped.
    pub async fn list_snapshots_all(&self) -> Result<Vec<Entity>, GatewayError> {
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            self.scope.checkpoint(&ResourceType::EC2_SNAPSHOT)?;
            let response = self
                .client
                .describe_snapshots()
                .owner_ids("self")
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(aws_error("DescribeSnapshots"))?;

            for snapshot in response.snapshots() {
                let Some(id) = snapshot.snapshot_id() else {
                    continue;
                };

                items.push(
                    self.entity(ResourceType::EC2_SNAPSHOT, "snapshot/", id)
                        .with_created_at(to_chrono(snapshot.start_time()))
                        .with_tags(extract_ec2_tags(snapshot.tags()))
                        .with_payload(Payload::Ec2Snapshot(payload::Ec2Snapshot {
                            volume_id: snapshot.volume_id().map(str::to_string),
                            volume_size_gib: snapshot.volume_size(),
                            state: snapshot.state().map(|s| s.as_str().to_string()),
                            encrypted: snapshot.encrypted(),
                        })),
                );
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        trace!(count = items.len(), region = %self.scope.region, "Listed EBS snapshots");
        Ok(items)
    }
}
