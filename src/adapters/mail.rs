//! Transactional mail seam

use crate::config::SecretString;
use crate::domain::{DeliveryOutcome, OutboundMessage, Result};
use async_trait::async_trait;

/// Sends one message and returns per-recipient outcomes
///
/// Errors are reserved for transport or API level failures. A recipient the
/// provider rejected is reported through its [`DeliveryOutcome`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        api_key: &SecretString,
        message: &OutboundMessage,
    ) -> Result<Vec<DeliveryOutcome>>;
}
