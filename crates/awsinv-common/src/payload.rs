//! Per-service entity payloads
//!
//! A closed set: every payload variant is listed here with its serde shape, so
//! any cache backend can decode any entity it wrote. Adding a resource type
//! with service-specific detail means adding a variant.

use serde::{Deserialize, Serialize};

/// Service-specific detail attached to an [`crate::Entity`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// No service detail captured
    #[default]
    None,
    Ec2Instance(Ec2Instance),
    Ec2Volume(Ec2Volume),
    Ec2Vpc(Ec2Vpc),
    Ec2Snapshot(Ec2Snapshot),
    S3Bucket(S3Bucket),
    IamUser(IamUser),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ec2Instance {
    pub instance_type: Option<String>,
    pub state: Option<String>,
    pub private_ip_address: Option<String>,
    pub vpc_id: Option<String>,
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ec2Volume {
    pub volume_type: Option<String>,
    pub size_gib: Option<i32>,
    pub state: Option<String>,
    pub encrypted: Option<bool>,
    pub attached_instances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ec2Vpc {
    pub cidr_block: Option<String>,
    pub is_default: bool,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ec2Snapshot {
    pub volume_id: Option<String>,
    pub volume_size_gib: Option<i32>,
    pub state: Option<String>,
    pub encrypted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct S3Bucket {
    pub bucket_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IamUser {
    pub user_id: String,
    pub path: String,
    pub password_last_used: Option<chrono::DateTime<chrono::Utc>>,
}
