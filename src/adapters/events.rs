//! Event bus publishing

use crate::domain::{Result, VigilError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_eventbridge::Client;

/// One event ready for the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    pub event_bus_name: String,
    pub source: String,
    pub detail_type: String,
    /// JSON document
    pub detail: String,
    pub resources: Vec<String>,
}

/// Publishes structured events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BusEvent) -> Result<()>;
}

/// EventBridge implementation of [`EventPublisher`]
#[derive(Clone)]
pub struct EventBridgePublisher {
    client: Client,
}

impl EventBridgePublisher {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn publish(&self, event: &BusEvent) -> Result<()> {
        let entry = PutEventsRequestEntry::builder()
            .event_bus_name(&event.event_bus_name)
            .source(&event.source)
            .detail_type(&event.detail_type)
            .detail(&event.detail)
            .set_resources(Some(event.resources.clone()))
            .build();

        let output = self
            .client
            .put_events()
            .entries(entry)
            .send()
            .await
            .map_err(|e| {
                VigilError::Notification(format!("PutEvents failed: {}", DisplayErrorContext(&e)))
            })?;

        if let Some(failed) = output.entries().iter().find(|e| e.error_code().is_some()) {
            return Err(VigilError::Notification(format!(
                "Event rejected by bus {}: {} {}",
                event.event_bus_name,
                failed.error_code().unwrap_or_default(),
                failed.error_message().unwrap_or_default()
            )));
        }

        tracing::debug!(
            event_bus = %event.event_bus_name,
            event_id = ?output.entries().first().and_then(|e| e.event_id()),
            "Event accepted by bus"
        );

        Ok(())
    }
}
