//! External system integrations for Vigil.
//!
//! Each external dependency sits behind an `async_trait` seam so the
//! orchestration in [`crate::core`] can be exercised with in-memory fakes:
//!
//! - [`inspector`] - findings report creation and status ([`FindingsReportService`])
//! - [`storage`] - object listing, size lookup and downloads ([`ObjectStore`])
//! - [`events`] - completion event publishing ([`EventPublisher`])
//! - [`identity`] - caller account and parameter store secrets
//! - [`mail`] / [`mandrill`] - transactional email ([`MailTransport`])
//! - [`aws`] - shared SDK configuration
//!
//! # Wiring the AWS implementations
//!
//! ```rust,no_run
//! use vigil::adapters::{aws, InspectorReportService, S3ObjectStore};
//! use vigil::config::AwsConfig;
//!
//! # async fn example() {
//! let sdk_config = aws::load_sdk_config(&AwsConfig::default()).await;
//! let reports = InspectorReportService::new(&sdk_config);
//! let store = S3ObjectStore::new(&sdk_config, false);
//! # }
//! ```

pub mod aws;
pub mod events;
pub mod identity;
pub mod inspector;
pub mod mail;
pub mod mandrill;
pub mod storage;

pub use events::{BusEvent, EventBridgePublisher, EventPublisher};
pub use identity::{AccountIdentity, SecretSource, SsmSecretSource, StsIdentity};
pub use inspector::{FindingsReportService, InspectorReportService, ReportStatusSnapshot};
pub use mail::MailTransport;
pub use mandrill::MandrillClient;
pub use storage::{ObjectReader, ObjectStore, ObjectSummary, S3ObjectStore};
