//! Core business logic for Vigil.
//!
//! # Modules
//!
//! - [`export`] - Request building, report polling and run coordination
//! - [`locator`] - Resolving a finished report's prefix to its object
//! - [`notifier`] - Completion event publishing
//! - [`attachments`] - Size-adaptive attachment encoding
//! - [`mailer`] - Recipient resolution, message composition and sending
//! - [`response`] - Invocation responses shared by both entry points
//!
//! # Workflow
//!
//! 1. **Build**: one or two report requests for the current month
//! 2. **Submit**: one at a time, waiting for each before the next
//! 3. **Wait**: poll every submitted report until done or the ceiling passes
//! 4. **Locate**: find the newest CSV under each finished report's prefix
//! 5. **Announce**: publish a single event carrying every located artifact
//! 6. **Mail**: triggered by that event, attach every artifact and send once
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::adapters::{aws, EventBridgePublisher, InspectorReportService, S3ObjectStore};
//! use vigil::config::load_config;
//! use vigil::core::export::{ExportCoordinator, RunContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! let sdk_config = aws::load_sdk_config(&config.aws).await;
//!
//! let ctx = RunContext {
//!     account_id: "123456789012".to_string(),
//!     region: "us-east-1".to_string(),
//!     environment: config.environment.as_str().to_string(),
//! };
//! let coordinator = ExportCoordinator::new(
//!     &config,
//!     ctx,
//!     Arc::new(InspectorReportService::new(&sdk_config)),
//!     Arc::new(S3ObjectStore::new(&sdk_config, false)),
//!     Arc::new(EventBridgePublisher::new(&sdk_config)),
//! );
//!
//! let summary = coordinator.run(chrono::Utc::now()).await?;
//! println!("Resolved {} of {} reports", summary.bundle.len(), summary.requested);
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod export;
pub mod locator;
pub mod mailer;
pub mod notifier;
pub mod response;
