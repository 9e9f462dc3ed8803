//! IAM policy document parsing for assumable-role discovery

use awsinv_common::defaults::ASSUME_ROLE_ACTION;
use serde::Deserialize;
use thiserror::Error;

/// A JSON field that IAM allows as either a single value or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v).iter(),
            OneOrMany::Many(vs) => vs.iter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
    #[serde(rename = "Statement")]
    pub statement: OneOrMany<Statement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    #[serde(rename = "Effect", default)]
    pub effect: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Option<OneOrMany<String>>,
    #[serde(rename = "Resource", default)]
    pub resource: Option<OneOrMany<String>>,
}

impl Statement {
    fn has_action(&self, action: &str) -> bool {
        self.action
            .as_ref()
            .is_some_and(|a| a.iter().any(|candidate| candidate == action))
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy document is not URL-encoded UTF-8: {0}")]
    UrlDecode(#[from] std::string::FromUtf8Error),

    #[error("policy document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a policy document as returned by `GetPolicyVersion`.
///
/// IAM returns documents in query-escaped form, so `+` is a space.
pub fn decode_policy_document(raw: &str) -> Result<PolicyDocument, PolicyError> {
    let unplussed = raw.replace('+', " ");
    let decoded = urlencoding::decode(&unplussed)?;
    Ok(serde_json::from_str(&decoded)?)
}

/// Resources of every statement granting `sts:AssumeRole`, in document order.
pub fn assumable_role_arns(document: &PolicyDocument) -> Vec<String> {
    document
        .statement
        .iter()
        .filter(|s| s.has_action(ASSUME_ROLE_ACTION))
        .filter_map(|s| s.resource.as_ref())
        .flat_map(|r| r.iter().cloned())
        .collect()
}
