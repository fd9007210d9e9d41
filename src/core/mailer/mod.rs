//! Report mailer
//!
//! Handles one mailer trigger end to end: resolve recipients and the API key,
//! build every attachment, and send a single message carrying all of them.
//!
//! Outcomes map to invocation responses:
//!
//! | Situation | Response |
//! |---|---|
//! | missing recipients, API key, sender or artifacts | 400 configuration error, nothing sent |
//! | any artifact failed to attach | 500 with the failures, nothing sent |
//! | encoded attachments exceed `mail.provider_limit_bytes` | 500 with the sizes, nothing sent |
//! | message handed to the provider | 200 with per-recipient outcomes |
//!
//! A failure of the send call itself, or of the parameter store lookup for
//! the API key, is returned as an error.

pub mod message;
pub mod recipients;

pub use message::{compose_message, MessageContext};
pub use recipients::{resolve_recipients, RecipientSet};

use crate::adapters::{MailTransport, ObjectStore, SecretSource};
use crate::config::{MailConfig, SecretString};
use crate::core::attachments::{
    encoded_size, AttachmentPipeline, AttachmentSettings, PipelineOutcome,
};
use crate::core::response::InvocationResponse;
use crate::domain::{MailerTrigger, Result, VigilError};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;

/// Response returned by [`ReportMailer::handle`]
pub type MailerResponse = InvocationResponse;

pub struct ReportMailer {
    config: MailConfig,
    pipeline: AttachmentPipeline,
    transport: Arc<dyn MailTransport>,
    secrets: Option<Arc<dyn SecretSource>>,
}

impl ReportMailer {
    /// Create a mailer
    ///
    /// `secrets` is consulted for the API key only when `mail.api_key` is
    /// not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment settings are invalid
    pub fn new(
        config: MailConfig,
        store: Arc<dyn ObjectStore>,
        transport: Arc<dyn MailTransport>,
        secrets: Option<Arc<dyn SecretSource>>,
    ) -> Result<Self> {
        let settings = AttachmentSettings::from_config(&config)?;
        Ok(Self {
            pipeline: AttachmentPipeline::new(store, settings),
            config,
            transport,
            secrets,
        })
    }

    /// Process one trigger
    ///
    /// # Errors
    ///
    /// Returns an error when the mail transport fails or the API key cannot
    /// be read from the parameter store.
    pub async fn handle(&self, trigger: &MailerTrigger) -> Result<MailerResponse> {
        let recipients = match resolve_recipients(&self.config, trigger) {
            Ok(recipients) => recipients,
            Err(e) => return Ok(configuration_error(e)),
        };

        let api_key = match self.api_key().await {
            Ok(key) => key,
            Err(e @ VigilError::Configuration(_)) => return Ok(configuration_error(e)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read mail API key");
                return Err(e);
            }
        };

        if trigger.artifacts.is_empty() {
            return Ok(configuration_error(VigilError::Validation(
                "Trigger carries no artifacts".to_string(),
            )));
        }

        let report_date = trigger.generated_at.unwrap_or_else(Utc::now).date_naive();

        tracing::info!(
            artifacts = trigger.artifacts.len(),
            recipients = recipients.len(),
            test_mode = recipients.test_mode,
            report_date = %report_date,
            "Preparing report email"
        );

        let attachments = match self
            .pipeline
            .build(&trigger.artifacts, trigger.bucket.as_deref(), report_date)
            .await
        {
            PipelineOutcome::Ready(attachments) => attachments,
            PipelineOutcome::Failed { prepared, failures } => {
                tracing::error!(
                    failed = failures.len(),
                    prepared = prepared,
                    "Attachments incomplete, report email not sent"
                );
                let failed: Vec<_> = failures
                    .iter()
                    .map(|f| json!({ "artifact": f.reference, "reason": f.reason }))
                    .collect();
                return Ok(InvocationResponse::failure(json!({
                    "error": "partial_failure",
                    "message": "One or more reports could not be attached; no email was sent",
                    "prepared": prepared,
                    "failed": failed,
                })));
            }
        };

        let payload_bytes = encoded_size(&attachments);
        if payload_bytes > self.config.provider_limit_bytes {
            tracing::error!(
                payload_bytes = payload_bytes,
                limit_bytes = self.config.provider_limit_bytes,
                attachments = attachments.len(),
                "Attachments exceed the provider payload limit, report email not sent"
            );
            let sizes: Vec<_> = attachments
                .iter()
                .map(|a| json!({ "name": a.name, "encoded_bytes": a.content.len() }))
                .collect();
            return Ok(InvocationResponse::failure(json!({
                "error": "payload_too_large",
                "message": "Encoded attachments exceed the mail provider limit; no email was sent",
                "encoded_bytes": payload_bytes,
                "limit_bytes": self.config.provider_limit_bytes,
                "attachments": sizes,
            })));
        }

        let ctx = MessageContext {
            report_date: Some(report_date),
            environment: trigger.environment.clone(),
            object_keys: trigger
                .artifacts
                .iter()
                .filter_map(|a| a.key.clone())
                .collect(),
        };

        let message = match compose_message(&self.config, &recipients, attachments, &ctx) {
            Ok(message) => message,
            Err(e) => return Ok(configuration_error(e)),
        };
        let attachment_names: Vec<String> =
            message.attachments.iter().map(|a| a.name.clone()).collect();

        let outcomes = self.transport.send(&api_key, &message).await?;

        for outcome in &outcomes {
            outcome.log();
        }
        let accepted = outcomes.iter().filter(|o| o.status.is_accepted()).count();

        tracing::info!(
            accepted = accepted,
            rejected = outcomes.len() - accepted,
            attachments = attachment_names.len(),
            "Report email sent"
        );

        Ok(InvocationResponse::ok(json!({
            "message": "Report email sent",
            "test_mode": recipients.test_mode,
            "attachments": attachment_names,
            "accepted": accepted,
            "results": outcomes,
        })))
    }

    async fn api_key(&self) -> Result<SecretString> {
        if let Some(key) = &self.config.api_key {
            if !key.expose_secret().is_blank() {
                return Ok(key.clone());
            }
        }

        match &self.secrets {
            Some(secrets) => {
                let parameter = self.config.api_key_parameter();
                tracing::debug!(parameter = %parameter, "Reading mail API key from parameter store");
                secrets.secret(&parameter).await
            }
            None => Err(VigilError::Configuration(
                "Mail API key not configured".to_string(),
            )),
        }
    }
}

fn configuration_error(error: VigilError) -> MailerResponse {
    let message = match error {
        VigilError::Configuration(message) | VigilError::Validation(message) => message,
        other => other.to_string(),
    };
    tracing::error!(error = %message, "Report mailer configuration error");
    InvocationResponse::configuration_error(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ObjectReader, ObjectSummary};
    use crate::config::secret_string;
    use crate::domain::{
        ArtifactDescriptor, DeliveryOutcome, DeliveryStatus, OutboundMessage, RecipientList,
        StorageError,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        objects: HashMap<String, Vec<u8>>,
    }

    impl MemoryStore {
        fn with(key: &str, body: &[u8]) -> Self {
            let mut objects = HashMap::new();
            objects.insert(key.to_string(), body.to_vec());
            Self { objects }
        }

        fn body(&self, key: &str) -> Result<&Vec<u8>> {
            self.objects
                .get(key)
                .ok_or_else(|| StorageError::NotFound(key.to_string()).into())
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn list_objects(&self, _bucket: &str, _prefix: &str) -> Result<Vec<ObjectSummary>> {
            Ok(Vec::new())
        }

        async fn object_size(&self, _bucket: &str, key: &str) -> Result<u64> {
            Ok(self.body(key)?.len() as u64)
        }

        async fn get_object(&self, _bucket: &str, key: &str) -> Result<Vec<u8>> {
            Ok(self.body(key)?.clone())
        }

        async fn open_object(&self, _bucket: &str, key: &str) -> Result<ObjectReader> {
            Ok(Box::pin(std::io::Cursor::new(self.body(key)?.clone())))
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(
            &self,
            _api_key: &SecretString,
            message: &OutboundMessage,
        ) -> Result<Vec<DeliveryOutcome>> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(message
                .to
                .iter()
                .map(|r| DeliveryOutcome {
                    email: r.email.as_str().to_string(),
                    status: DeliveryStatus::Sent,
                    provider_id: Some("abc".to_string()),
                    reject_reason: None,
                })
                .collect())
        }
    }

    struct FixedSecret;

    #[async_trait]
    impl SecretSource for FixedSecret {
        async fn secret(&self, name: &str) -> Result<SecretString> {
            assert_eq!(name, "/mailchimp/inspectorreport/API_KEY");
            Ok(secret_string("from-ssm".to_string()))
        }
    }

    struct UnavailableSecret;

    #[async_trait]
    impl SecretSource for UnavailableSecret {
        async fn secret(&self, _name: &str) -> Result<SecretString> {
            Err(VigilError::ExternalService("ThrottlingException: Rate exceeded".to_string()))
        }
    }

    fn config() -> MailConfig {
        MailConfig {
            api_key: Some(secret_string("md-test".to_string())),
            from_email: "security@example.com".to_string(),
            to_emails: "ops@example.com".to_string(),
            ..Default::default()
        }
    }

    fn trigger() -> MailerTrigger {
        MailerTrigger {
            bucket: Some("reports".to_string()),
            artifacts: vec![ArtifactDescriptor {
                key: Some("reports/2024-05/ec2-instances/r.csv".to_string()),
                file_name: Some("r.csv".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn mailer(
        config: MailConfig,
        transport: Arc<RecordingTransport>,
        secrets: Option<Arc<dyn SecretSource>>,
    ) -> ReportMailer {
        let store = MemoryStore::with("reports/2024-05/ec2-instances/r.csv", b"id,severity\n1,HIGH\n");
        ReportMailer::new(config, Arc::new(store), transport, secrets).unwrap()
    }

    #[tokio::test]
    async fn test_handle_sends_one_message() {
        let transport = Arc::new(RecordingTransport::default());
        let response = mailer(config(), transport.clone(), None)
            .handle(&trigger())
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["accepted"], 1);
        assert_eq!(response.body["attachments"][0], "r.csv");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachments[0].media_type, "text/csv");
        assert!(!sent[0].subject.starts_with("[TEST]"));
    }

    #[tokio::test]
    async fn test_handle_reads_api_key_from_secret_source() {
        let transport = Arc::new(RecordingTransport::default());
        let config = MailConfig {
            api_key: None,
            ..config()
        };
        let response = mailer(config, transport.clone(), Some(Arc::new(FixedSecret)))
            .handle(&trigger())
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_without_api_key_is_configuration_error() {
        let transport = Arc::new(RecordingTransport::default());
        let config = MailConfig {
            api_key: None,
            ..config()
        };
        let response = mailer(config, transport.clone(), None)
            .handle(&trigger())
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_empty_test_override_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let trigger = MailerTrigger {
            test_mode: true,
            test_to_emails: Some(RecipientList(Vec::new())),
            ..trigger()
        };
        let response = mailer(config(), transport.clone(), None)
            .handle(&trigger)
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_missing_artifact_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let mut trigger = trigger();
        trigger.artifacts.push(ArtifactDescriptor {
            key: Some("reports/2024-05/non-ec2-resources/missing.csv".to_string()),
            ..Default::default()
        });

        let response = mailer(config(), transport.clone(), None)
            .handle(&trigger)
            .await
            .unwrap();

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body["prepared"], 1);
        assert_eq!(
            response.body["failed"][0]["artifact"],
            "reports/reports/2024-05/non-ec2-resources/missing.csv"
        );
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_without_artifacts_is_configuration_error() {
        let transport = Arc::new(RecordingTransport::default());
        let trigger = MailerTrigger {
            artifacts: Vec::new(),
            ..trigger()
        };
        let response = mailer(config(), transport, None)
            .handle(&trigger)
            .await
            .unwrap();
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn test_parameter_store_outage_is_an_error() {
        let transport = Arc::new(RecordingTransport::default());
        let config = MailConfig {
            api_key: None,
            ..config()
        };
        let result = mailer(config, transport.clone(), Some(Arc::new(UnavailableSecret)))
            .handle(&trigger())
            .await;

        assert!(matches!(result, Err(VigilError::ExternalService(_))));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_over_provider_limit_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let config = MailConfig {
            compression_threshold_bytes: 8,
            provider_limit_bytes: 16,
            ..config()
        };
        let response = mailer(config, transport.clone(), None)
            .handle(&trigger())
            .await
            .unwrap();

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body["error"], "payload_too_large");
        assert_eq!(response.body["limit_bytes"], 16);
        assert_eq!(response.body["attachments"][0]["name"], "r.csv.zip");
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
