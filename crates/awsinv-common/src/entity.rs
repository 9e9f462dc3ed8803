//! Common resource representation produced by every adapter

use crate::account::AccountId;
use crate::payload::Payload;
use crate::region::Region;
use crate::resource_type::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name reported for resources without a `Name` tag or intrinsic name
pub const UNNAMED: &str = "-";

/// A discovered cloud resource
///
/// `created_at` is the Unix epoch when the source service gives no reliable
/// creation time. Treat that as unknown, see [`Entity::created_at_known`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub account_id: AccountId,
    pub region: Region,
    pub id: String,
    pub arn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub payload: Payload,
}

impl Entity {
    /// Minimal entity with unknown creation time, no ARN, tags or payload.
    pub fn new(
        account_id: AccountId,
        region: Region,
        resource_type: ResourceType,
        id: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            region,
            id: id.into(),
            arn: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            resource_type,
            name: UNNAMED.to_string(),
            tags: HashMap::new(),
            payload: Payload::None,
        }
    }

    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set tags, taking the name from the `Name` tag when present.
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        if let Some(name) = tags.get("Name") {
            self.name = name.clone();
        }
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// ID if set, otherwise the ARN.
    pub fn id_or_arn(&self) -> &str {
        if !self.id.is_empty() {
            return &self.id;
        }
        self.arn.as_deref().unwrap_or_default()
    }

    /// False when `created_at` is the epoch placeholder.
    pub fn created_at_known(&self) -> bool {
        self.created_at != DateTime::<Utc>::UNIX_EPOCH
    }
}

/// Build an ARN of the form `arn:aws:{service}:{region}:{account}:{prefix}{id}`.
pub fn build_arn(
    account_id: &AccountId,
    region: &Region,
    service: &str,
    prefix: &str,
    id: &str,
) -> String {
    format!("arn:aws:{service}:{region}:{account_id}:{prefix}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Ec2Instance;

    fn instance() -> Entity {
        Entity::new(
            AccountId::from("111111111111"),
            Region::from("eu-west-1"),
            ResourceType::EC2_INSTANCE,
            "i-0abc",
        )
    }

    #[test]
    fn defaults_are_unknown() {
        let e = instance();
        assert_eq!(e.name, UNNAMED);
        assert!(!e.created_at_known());
        assert_eq!(e.payload, Payload::None);
    }

    #[test]
    fn name_tag_sets_name() {
        let tags = HashMap::from([("Name".to_string(), "web-1".to_string())]);
        let e = instance().with_tags(tags);
        assert_eq!(e.name, "web-1");
        assert_eq!(e.tags.get("Name").map(String::as_str), Some("web-1"));
    }

    #[test]
    fn id_or_arn_falls_back_to_arn() {
        let mut e = instance().with_arn("arn:aws:ec2:eu-west-1:111111111111:instance/i-0abc");
        assert_eq!(e.id_or_arn(), "i-0abc");
        e.id.clear();
        assert_eq!(
            e.id_or_arn(),
            "arn:aws:ec2:eu-west-1:111111111111:instance/i-0abc"
        );
    }

    #[test]
    fn build_arn_format() {
        let arn = build_arn(
            &AccountId::from("1"),
            &Region::from("us-east-1"),
            "ec2",
            "volume/",
            "vol-1",
        );
        assert_eq!(arn, "arn:aws:ec2:us-east-1:1:volume/vol-1");
    }

    #[test]
    fn survives_json_with_payload() {
        let e = instance()
            .with_created_at(DateTime::from_timestamp(1_700_000_000, 0))
            .with_payload(Payload::Ec2Instance(Ec2Instance {
                instance_type: Some("t3.micro".into()),
                ..Default::default()
            }));
        let json = serde_json::to_string(&e).unwrap();
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!(back.created_at_known());
    }
}
