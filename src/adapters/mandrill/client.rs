//! Mandrill HTTP client

use super::models::{ApiErrorBody, SendRequest, SendResponse};
use crate::adapters::mail::MailTransport;
use crate::config::{MailConfig, SecretString};
use crate::domain::{DeliveryOutcome, MailError, OutboundMessage, Result, VigilError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Mandrill transactional mail client
///
/// # Example
///
/// ```no_run
/// use vigil::adapters::mandrill::MandrillClient;
/// use vigil::config::MailConfig;
///
/// # fn example() -> vigil::domain::Result<()> {
/// let client = MandrillClient::new(&MailConfig::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MandrillClient {
    base_url: String,
    client: Client,
}

impl MandrillClient {
    /// Create a client from the mail configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VigilError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn send_url(&self) -> String {
        format!("{}/messages/send.json", self.base_url)
    }
}

#[async_trait]
impl MailTransport for MandrillClient {
    async fn send(
        &self,
        api_key: &SecretString,
        message: &OutboundMessage,
    ) -> Result<Vec<DeliveryOutcome>> {
        let start = std::time::Instant::now();
        let request = SendRequest {
            key: api_key.expose_secret().as_ref(),
            message,
        };

        let response = self
            .client
            .post(self.send_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => MailError::Api {
                    status: status.as_u16(),
                    name: parsed.name,
                    message: parsed.message,
                },
                Err(_) => MailError::Api {
                    status: status.as_u16(),
                    name: "Unknown".to_string(),
                    message: body,
                },
            };
            tracing::error!(error = %error, "Mail API request failed");
            return Err(error.into());
        }

        let outcomes = serde_json::from_str::<SendResponse>(&body)
            .map_err(|e| MailError::InvalidResponse(format!("{e}: {body}")))?
            .0;

        tracing::info!(
            recipients = outcomes.len(),
            attachments = message.attachments.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Mail API request completed"
        );

        Ok(outcomes)
    }
}
