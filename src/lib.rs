// Vigil - Inspector findings export and report mailer
// Copyright (c) 2025 Vigil Contributors
// Licensed under the MIT License

//! # Vigil - Inspector findings export and report mailer
//!
//! Vigil produces the monthly AWS Inspector findings reports for an account
//! and mails them to the security team.
//!
//! ## Overview
//!
//! Two entry points share this library:
//! - **export**: builds one or two report requests for the month, submits
//!   them one at a time, polls until each finishes, locates the written CSV
//!   files and publishes a single completion event
//! - **send**: triggered by that event, turns every referenced report into an
//!   attachment (zipped when too large) and sends one email carrying them all
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Orchestration (export run, locator, notifier, attachments, mailer)
//! - [`adapters`] - External integrations (Inspector, S3, EventBridge, STS, SSM, Mandrill)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::adapters::{aws, MandrillClient, S3ObjectStore, SsmSecretSource};
//! use vigil::config::load_config;
//! use vigil::core::mailer::ReportMailer;
//! use vigil::domain::MailerTrigger;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("vigil.toml")?;
//!     let sdk_config = aws::load_sdk_config(&config.aws).await;
//!
//!     let mailer = ReportMailer::new(
//!         config.mail.clone(),
//!         Arc::new(S3ObjectStore::new(&sdk_config, false)),
//!         Arc::new(MandrillClient::new(&config.mail)?),
//!         Some(Arc::new(SsmSecretSource::new(&sdk_config))),
//!     )?;
//!
//!     let trigger = MailerTrigger::from_json(&std::fs::read_to_string("event.json")?)?;
//!     let response = mailer.handle(&trigger).await?;
//!     println!("{}", response.status_code);
//!     Ok(())
//! }
//! ```
//!
//! ## Attachment sizing
//!
//! Reports at or under `mail.compression_threshold_bytes` are streamed and
//! base64-encoded in chunks whose size is a multiple of 3, so the joined
//! output equals a one-shot encoding. Larger reports are downloaded, zipped at
//! the maximum level and attached as `<name>.zip`.
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error is
//! [`domain::VigilError`]. Recoverable conditions such as a report that
//! never finished or a recipient the provider rejected are reported in
//! summaries and responses instead of errors.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
