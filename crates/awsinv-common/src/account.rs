//! Account identifiers, role ARNs and ARN parsing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Strongly-typed AWS account ID
///
/// Not validated as 12 digits; S3 ARNs and fixtures carry other shapes.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
    derive_more::From,
)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// ARN of a role that may be assumed into another account
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct RoleArn(String);

impl RoleArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into components.
    pub fn parse(&self) -> Result<Arn, ArnError> {
        self.0.parse()
    }
}

/// Errors from ARN parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArnError {
    #[error("ARN must start with 'arn:': {0}")]
    MissingPrefix(String),

    #[error("ARN has {sections} sections, expected 6: {arn}")]
    NotEnoughSections { arn: String, sections: usize },
}

/// Parsed `arn:partition:service:region:account-id:resource`
///
/// The resource component keeps any further `:` or `/` separators verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn account(&self) -> AccountId {
        AccountId::new(self.account_id.clone())
    }
}

impl FromStr for Arn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("arn:") {
            return Err(ArnError::MissingPrefix(s.to_string()));
        }

        let sections: Vec<&str> = s.splitn(6, ':').collect();
        if sections.len() != 6 {
            return Err(ArnError::NotEnoughSections {
                arn: s.to_string(),
                sections: sections.len(),
            });
        }

        Ok(Arn {
            partition: sections[1].to_string(),
            service: sections[2].to_string(),
            region: sections[3].to_string(),
            account_id: sections[4].to_string(),
            resource: sections[5].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
