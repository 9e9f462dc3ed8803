//! Per-service adapters mapping AWS listings into [`Entity`] values
//!
//! Each repository is built from an SDK client plus the [`Scope`] of the
//! gateway calling it, and exposes `list_*_all` methods that follow
//! pagination to the end.
//!
//! [`Entity`]: awsinv_common::Entity

pub mod ec2;
pub mod iam;
pub mod s3;

use crate::aws::error::classify_sdk_error;
use crate::gateway::GatewayError;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use awsinv_common::{AccountId, Region, ResourceType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Account, region and cancellation signal shared by every adapter call
#[derive(Debug, Clone)]
pub struct Scope {
    pub account_id: AccountId,
    pub region: Region,
    pub cancel: CancellationToken,
}

impl Scope {
    pub fn new(account_id: AccountId, region: Region) -> Self {
        Self {
            account_id,
            region,
            cancel: CancellationToken::new(),
        }
    }

    /// Fail if cancellation was requested; called between pages.
    pub(crate) fn checkpoint(&self, resource_type: &ResourceType) -> Result<(), GatewayError> {
        if self.cancel.is_cancelled() {
            return Err(GatewayError::Cancelled(resource_type.clone()));
        }
        Ok(())
    }
}

/// Map an SDK error for `operation` into a classified gateway error.
pub(crate) fn aws_error<E>(operation: &'static str) -> impl FnOnce(E) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    move |e| GatewayError::Aws {
        operation,
        source: classify_sdk_error(&e),
    }
}

/// Extract tags from any AWS tag type into a HashMap.
///
/// Different AWS SDKs use different tag types (ec2::Tag, s3::Tag, iam::Tag)
/// but they all have key/value string fields. This generic function handles
/// them all via closures.
pub(crate) fn extract_tags<T>(
    tags: &[T],
    key: impl Fn(&T) -> Option<&str>,
    value: impl Fn(&T) -> Option<&str>,
) -> HashMap<String, String> {
    tags.iter()
        .filter_map(|t| match (key(t), value(t)) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

/// Convert an SDK timestamp.
pub(crate) fn to_chrono(dt: Option<&aws_sdk_ec2::primitives::DateTime>) -> Option<DateTime<Utc>> {
    dt.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_tags_skips_partial_pairs() {
        let tags = vec![
            aws_sdk_ec2::types::Tag::builder().key("Name").value("web").build(),
            aws_sdk_ec2::types::Tag::builder().key("orphan").build(),
        ];
        let map = extract_tags(&tags, |t| t.key(), |t| t.value());
        assert_eq!(map.len(), 1);
        assert_eq!(map["Name"], "web");
    }

    #[test]
    fn to_chrono_converts() {
        let dt = aws_sdk_ec2::primitives::DateTime::from_secs(1_700_000_000);
        assert_eq!(to_chrono(Some(&dt)).unwrap().timestamp(), 1_700_000_000);
        assert_eq!(to_chrono(None), None);
    }

    #[test]
    fn checkpoint_honors_cancel() {
        let scope = Scope::new(AccountId::from("1"), Region::from("eu-west-1"));
        assert!(scope.checkpoint(&ResourceType::EC2_VPC).is_ok());
        scope.cancel.cancel();
        assert!(matches!(
            scope.checkpoint(&ResourceType::EC2_VPC),
            Err(GatewayError::Cancelled(_))
        ));
    }
}
