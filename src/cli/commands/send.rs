//! Send command implementation
//!
//! Reads a mailer trigger (an event-bus envelope, its bare detail, or a
//! storage "Object Created" notification) from a file or stdin and emails the
//! referenced reports.

use super::print_response;
use crate::adapters::{aws, MandrillClient, S3ObjectStore, SecretSource, SsmSecretSource};
use crate::cli::resolve_config;
use crate::core::mailer::ReportMailer;
use crate::core::response::InvocationResponse;
use crate::domain::{MailerTrigger, RecipientList};
use clap::Args;
use std::io::Read;
use std::sync::Arc;

/// Arguments for the send command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Trigger event JSON file (reads stdin when omitted)
    #[arg(short, long)]
    pub event: Option<String>,

    /// Send in test mode to the override recipients only
    #[arg(long)]
    pub test_mode: bool,

    /// Comma-separated test recipients, implies --test-mode
    #[arg(long, value_name = "EMAILS")]
    pub test_to: Option<String>,

    /// Comma-separated test copy recipients
    #[arg(long, value_name = "EMAILS")]
    pub test_cc: Option<String>,
}

impl SendArgs {
    /// Execute the send command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!("Starting send command");

        let config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                print_response(&InvocationResponse::configuration_error(e.to_string()))?;
                return Ok(2);
            }
        };

        let raw = self.read_event()?;
        let trigger = match MailerTrigger::from_json(&raw) {
            Ok(trigger) => self.apply_overrides(trigger),
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to parse trigger event");
                print_response(&InvocationResponse::configuration_error(e.to_string()))?;
                return Ok(2);
            }
        };

        let sdk_config = aws::load_sdk_config(&config.aws).await;
        let path_style = config.aws.endpoint_url.is_some();
        let secrets: Arc<dyn SecretSource> = Arc::new(SsmSecretSource::new(&sdk_config));

        let mailer = match MandrillClient::new(&config.mail).and_then(|client| {
            ReportMailer::new(
                config.mail.clone(),
                Arc::new(S3ObjectStore::new(&sdk_config, path_style)),
                Arc::new(client),
                Some(secrets),
            )
        }) {
            Ok(mailer) => mailer,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to initialize mailer");
                print_response(&InvocationResponse::configuration_error(e.to_string()))?;
                return Ok(2);
            }
        };

        let response = match mailer.handle(&trigger).await {
            Ok(response) => response,
            Err(e) => {
                crate::log_error_with_context!(&e, "Report email failed");
                print_response(&InvocationResponse::failure(
                    serde_json::json!({ "error": "send_failed", "message": e.to_string() }),
                ))?;
                return Ok(4);
            }
        };

        print_response(&response)?;
        Ok(response.exit_code())
    }

    fn read_event(&self) -> anyhow::Result<String> {
        match &self.event {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => {
                let mut raw = String::new();
                std::io::stdin().read_to_string(&mut raw)?;
                Ok(raw)
            }
        }
    }

    /// Merge command-line test settings into the trigger
    fn apply_overrides(&self, mut trigger: MailerTrigger) -> MailerTrigger {
        if self.test_mode || self.test_to.is_some() {
            trigger.test_mode = true;
        }
        if let Some(to) = &self.test_to {
            trigger.test_to_emails = Some(parse_list(to));
        }
        if let Some(cc) = &self.test_cc {
            trigger.test_cc_emails = Some(parse_list(cc));
        }
        trigger
    }
}

fn parse_list(raw: &str) -> RecipientList {
    RecipientList(
        raw.split(',')
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    )
}
