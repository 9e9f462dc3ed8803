//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for logging and skip decisions
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded (the SDK retries these before surfacing them)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Caller lacks permission for the operation
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Region is not enabled for the account, or credentials are not valid there
    #[error("Region not enabled or credentials rejected: {message}")]
    RegionUnavailable { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, AwsError::AccessDenied { .. })
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::AccessDenied { .. } => Some(
                "Check that the assumed role's policies allow the List/Describe call for this service.",
            ),
            AwsError::RegionUnavailable { .. } => Some(
                "The region may not be enabled for this account. Enable it or drop it from --regions.",
            ),
            AwsError::Throttled => Some("AWS API rate limit hit. Increase --stagger to spread calls."),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["NoSuchEntity", "NoSuchBucket", "InvalidVpcID.NotFound"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for permission failures
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
];

/// Codes returned when a region is disabled or the credentials are foreign to it
const REGION_UNAVAILABLE_CODES: &[&str] = &[
    "OptInRequired",
    "AuthFailure",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "RegionDisabledException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if REGION_UNAVAILABLE_CODES.contains(&c) => AwsError::RegionUnavailable { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error that carries error metadata.
///
/// Errors without a code (timeouts, dispatch failures) keep their full
/// display chain as the message.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        Some(code) => classify_aws_error(Some(code), error.message()),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled));
        }
    }

    #[test]
    fn access_denied_has_suggestion() {
        let err = classify_aws_error(Some("UnauthorizedOperation"), Some("no ec2:Describe*"));
        assert!(err.is_access_denied());
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn disabled_region() {
        let err = classify_aws_error(Some("OptInRequired"), None);
        assert!(matches!(err, AwsError::RegionUnavailable { .. }));
        assert!(err.to_string().contains("Unknown error"));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert!(err.suggestion().is_none());

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }
}
