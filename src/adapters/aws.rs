//! Shared AWS SDK configuration
//!
//! Every AWS client in Vigil is built from one [`SdkConfig`] loaded here, with
//! adaptive retries and an optional endpoint override for local stacks.

use crate::config::AwsConfig;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Maximum attempts per SDK call, including the first one
const MAX_ATTEMPTS: u32 = 5;

/// Load the shared SDK configuration
///
/// The region comes from `[aws].region` when set and otherwise from the
/// default provider chain (environment, profile, instance metadata).
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(aws.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new("us-east-1"));

    let retry_config = RetryConfig::standard()
        .with_max_attempts(MAX_ATTEMPTS)
        .with_retry_mode(RetryMode::Adaptive);

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .retry_config(retry_config);

    if let Some(endpoint) = &aws.endpoint_url {
        tracing::info!(endpoint = %endpoint, "Using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    let config = loader.load().await;

    tracing::debug!(
        region = ?config.region().map(|r| r.as_ref().to_string()),
        "AWS SDK configuration loaded"
    );

    config
}

/// Region name of a loaded configuration, if resolved
pub fn region_name(config: &SdkConfig) -> Option<String> {
    config.region().map(|r| r.as_ref().to_string())
}
