//! Caller identity and parameter store lookups

use crate::config::{secret_string, SecretString};
use crate::domain::{Result, VigilError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::operation::get_parameter::GetParameterError;

/// Resolves the account the run executes in
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    async fn account_id(&self) -> Result<String>;
}

/// Reads named secrets
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn secret(&self, name: &str) -> Result<SecretString>;
}

/// STS implementation of [`AccountIdentity`]
#[derive(Clone)]
pub struct StsIdentity {
    client: aws_sdk_sts::Client,
}

impl StsIdentity {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(config),
        }
    }
}

#[async_trait]
impl AccountIdentity for StsIdentity {
    async fn account_id(&self) -> Result<String> {
        let output = self.client.get_caller_identity().send().await.map_err(|e| {
            VigilError::Configuration(format!(
                "Unable to resolve caller identity: {}",
                aws_sdk_sts::error::DisplayErrorContext(&e)
            ))
        })?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| VigilError::Configuration("Caller identity has no account".to_string()))
    }
}

/// SSM Parameter Store implementation of [`SecretSource`]
///
/// Parameters are read with decryption so `SecureString` values come back
/// in plain text.
#[derive(Clone)]
pub struct SsmSecretSource {
    client: aws_sdk_ssm::Client,
}

impl SsmSecretSource {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl SecretSource for SsmSecretSource {
    async fn secret(&self, name: &str) -> Result<SecretString> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| parameter_error(name, e))?;

        let value = output
            .parameter()
            .and_then(|p| p.value())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| VigilError::Configuration(format!("Parameter {} is empty", name)))?;

        Ok(secret_string(value.to_string()))
    }
}

/// A missing parameter is a configuration problem; anything else is an
/// outage of the parameter store.
fn parameter_error(name: &str, error: SdkError<GetParameterError>) -> VigilError {
    let not_found = error
        .as_service_error()
        .is_some_and(GetParameterError::is_parameter_not_found);
    parameter_failure(name, not_found, &DisplayErrorContext(&error).to_string())
}

fn parameter_failure(name: &str, not_found: bool, detail: &str) -> VigilError {
    if not_found {
        VigilError::Configuration(format!("Parameter {name} does not exist"))
    } else {
        VigilError::ExternalService(format!("Unable to read parameter {name}: {detail}"))
    }
}
