//! Completion notifier
//!
//! Publishes one event per run describing every resolved artifact. Delivery
//! is best effort: failures are logged and reported as `false`, never raised.

use crate::adapters::{BusEvent, EventPublisher};
use crate::config::NotificationConfig;
use crate::domain::CompletionBundle;
use std::sync::Arc;

pub struct CompletionNotifier {
    publisher: Arc<dyn EventPublisher>,
    config: NotificationConfig,
}

impl CompletionNotifier {
    pub fn new(publisher: Arc<dyn EventPublisher>, config: NotificationConfig) -> Self {
        Self { publisher, config }
    }

    /// Build the bus event for a bundle
    pub fn event_for(&self, bundle: &CompletionBundle) -> serde_json::Result<BusEvent> {
        Ok(BusEvent {
            event_bus_name: self.config.event_bus_name.clone(),
            source: self.config.source.clone(),
            detail_type: self.config.detail_type.clone(),
            detail: serde_json::to_string(bundle)?,
            resources: bundle.resource_arns(),
        })
    }

    /// Publish the bundle; returns whether the event was accepted
    pub async fn notify(&self, bundle: &CompletionBundle) -> bool {
        if !self.config.enabled {
            tracing::info!(run_id = %bundle.run_id, "Completion event disabled, skipping");
            return false;
        }

        if bundle.is_empty() {
            tracing::warn!(run_id = %bundle.run_id, "No artifacts resolved, nothing to announce");
            return false;
        }

        let event = match self.event_for(bundle) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(run_id = %bundle.run_id, error = %e, "Failed to serialize completion bundle");
                return false;
            }
        };

        match self.publisher.publish(&event).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %bundle.run_id,
                    event_bus = %event.event_bus_name,
                    artifacts = bundle.len(),
                    "Completion event published"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    run_id = %bundle.run_id,
                    event_bus = %event.event_bus_name,
                    error = %e,
                    "Failed to publish completion event"
                );
                false
            }
        }
    }
}
