//! Entity and identifier fixtures
//!
//! Fixtures use fixed timestamps so equality checks stay deterministic.

use awsinv_common::{AccountId, Entity, Region, ResourceType};
use chrono::DateTime;
use std::collections::HashMap;

pub fn account(id: &str) -> AccountId {
    AccountId::from(id)
}

pub fn region(code: &str) -> Region {
    Region::from(code)
}

/// A tagged entity with an ARN and a known creation time.
pub fn entity(account_id: &str, region_code: &str, resource_type: ResourceType, id: &str) -> Entity {
    let arn = format!(
        "arn:aws:test:{region_code}:{account_id}:{}/{id}",
        resource_type.canonical_name().replace("::", "-")
    );
    Entity::new(account(account_id), region(region_code), resource_type, id)
        .with_arn(arn)
        .with_created_at(DateTime::from_timestamp(1_700_000_000, 0))
        .with_tags(HashMap::from([("Name".to_string(), format!("{id}-name"))]))
}

/// `count` entities with ids `{prefix}-0 .. {prefix}-{count-1}`.
pub fn entities(
    account_id: &str,
    region_code: &str,
    resource_type: ResourceType,
    prefix: &str,
    count: usize,
) -> Vec<Entity> {
    (0..count)
        .map(|i| entity(account_id, region_code, resource_type.clone(), &format!("{prefix}-{i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_fixture_is_complete() {
        let e = entity("1", "eu-west-1", ResourceType::EC2_VPC, "vpc-1");
        assert_eq!(e.name, "vpc-1-name");
        assert!(e.created_at_known());
        assert!(e.arn.as_deref().unwrap().contains("vpc-1"));
    }

    #[test]
    fn entities_are_numbered() {
        let es = entities("1", "eu-west-1", ResourceType::EC2_VPC, "vpc", 3);
        let ids: Vec<_> = es.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["vpc-0", "vpc-1", "vpc-2"]);
    }
}
