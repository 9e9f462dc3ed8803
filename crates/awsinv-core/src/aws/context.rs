//! SDK configuration shared by every client built for one credential set

use awsinv_common::RoleArn;
use awsinv_common::defaults::{
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_BACKOFF, DEFAULT_SESSION_NAME,
};
use aws_config::retry::RetryConfig;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Loaded SDK config plus the region it is bound to
///
/// Cloning is cheap; derived contexts share the credentials provider and its
/// cache.
///
/// # Example
/// ```ignore
/// let base = AwsContext::new("us-east-1").await;
/// let assumed = AwsContext::assume_role(&base, &role).await;
///
/// // Same credentials, different region
/// let frankfurt = assumed.with_region("eu-central-1");
/// let ec2 = frankfurt.ec2_client();
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

/// Retry policy applied to every context built here.
pub fn retry_config() -> RetryConfig {
    RetryConfig::standard()
        .with_max_attempts(DEFAULT_RETRY_MAX_ATTEMPTS)
        .with_max_backoff(DEFAULT_RETRY_MAX_BACKOFF)
}

impl AwsContext {
    /// Default credential chain, bound to `region`, with [`retry_config`].
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .retry_config(retry_config())
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Wrap an already-built config.
    pub fn from_sdk_config(config: SdkConfig) -> Self {
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            region,
        }
    }

    /// Build a context whose credentials come from assuming `role` with the
    /// credentials of `base`.
    ///
    /// The assumed credentials are cached by the resulting config and shared
    /// by every context derived from it via [`AwsContext::with_region`].
    pub async fn assume_role(base: &AwsContext, role: &RoleArn) -> Self {
        let provider = AssumeRoleProvider::builder(role.as_str())
            .session_name(DEFAULT_SESSION_NAME)
            .region(Region::new(base.region.clone()))
            .configure(base.sdk_config())
            .build()
            .await;

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(base.region.clone()))
            .credentials_provider(provider)
            .retry_config(retry_config())
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: base.region.clone(),
        }
    }

    /// Same credentials and settings, bound to another region.
    pub fn with_region(&self, region: &str) -> Self {
        let config = self
            .config
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn ec2_client(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(self.sdk_config())
    }

    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(self.sdk_config())
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }

    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
