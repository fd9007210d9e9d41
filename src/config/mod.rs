//! Configuration management for Vigil.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Vigil reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VIGIL_*` environment overrides, so a deployment can run without a file
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vigil::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//!
//! println!("Reports bucket: {}", config.export.bucket);
//! println!("Compression above {} bytes", config.mail.compression_threshold_bytes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`AwsConfig`] - Region and endpoint overrides
//! - [`ExportConfig`] - Destination, mode, scope and polling bounds
//! - [`NotificationConfig`] - Completion event bus settings
//! - [`MailConfig`] - Mail API, recipients and attachment sizing
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [export]
//! bucket = "security-reports"
//! mode = "split"
//! vpc_id = "vpc-0abc1234"
//!
//! [mail]
//! api_key = "${VIGIL_MAIL_API_KEY}"
//! from_email = "security@example.com"
//! to_emails = "ops@example.com, audit@example.com"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{config_from_env, load_config, parse_config};
pub use schema::{
    ApplicationConfig, AwsConfig, Environment, ExportConfig, ExportMode, LoggingConfig,
    MailConfig, NotificationConfig, VigilConfig, MIB,
};
pub use secret::{secret_string, SecretString, SecretValue};
