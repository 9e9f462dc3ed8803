//! Resource type tags in AWS Config form (`AWS::EC2::Instance`)
//!
//! The set is open: any string is a valid resource type, and the well-known
//! constants below are simply the ones this workspace ships adapters for.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Whether a resource type must be fetched per region or once per account
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceScope {
    /// One fetch per region
    Regional,
    /// One fetch per account, from any region's client
    Global,
}

/// Open resource type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(Cow<'static, str>);

impl ResourceType {
    pub const EC2_INSTANCE: ResourceType = ResourceType::from_static("AWS::EC2::Instance");
    pub const EC2_VOLUME: ResourceType = ResourceType::from_static("AWS::EC2::Volume");
    pub const EC2_VPC: ResourceType = ResourceType::from_static("AWS::EC2::VPC");
    pub const EC2_SNAPSHOT: ResourceType = ResourceType::from_static("AWS::EC2::Snapshot");
    pub const S3_BUCKET: ResourceType = ResourceType::from_static("AWS::S3::Bucket");
    pub const IAM_USER: ResourceType = ResourceType::from_static("AWS::IAM::User");

    /// Types fetched once per account rather than per region.
    const GLOBAL: &'static [&'static str] = &["aws::iam::user", "aws::s3::bucket"];

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase name used for dispatch and cache keys.
    pub fn canonical_name(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn scope(&self) -> ResourceScope {
        if Self::GLOBAL.contains(&self.canonical_name().as_str()) {
            ResourceScope::Global
        } else {
            ResourceScope::Regional
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope() == ResourceScope::Global
    }

    /// Types with a shipped adapter.
    pub fn known() -> Vec<ResourceType> {
        vec![
            Self::EC2_INSTANCE,
            Self::EC2_VOLUME,
            Self::EC2_VPC,
            Self::EC2_SNAPSHOT,
            Self::S3_BUCKET,
            Self::IAM_USER,
        ]
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ResourceType {
    type Err = std::convert::Infallible;

    /// Matches well-known types case-insensitively so `aws::ec2::instance`
    /// and `AWS::EC2::Instance` compare equal after parsing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Ok(Self::known()
            .into_iter()
            .find(|t| t.canonical_name() == lower)
            .unwrap_or_else(|| ResourceType::new(s)))
    }
}
