//! Configuration schema types
//!
//! This module defines the configuration structure for Vigil.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// How the monthly findings are split into reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Scoped EC2 report (when a VPC is configured) plus a catch-all report
    #[default]
    Split,
    /// One report with every active finding
    Full,
}

/// Main Vigil configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VigilConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// AWS client settings
    #[serde(default)]
    pub aws: AwsConfig,

    /// Findings export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Completion event settings
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Report mailer settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VigilConfig {
    /// Validates the configuration
    ///
    /// Recipient lists and the mail API key are deliberately not checked
    /// here; the mailer reports them as configuration-error responses.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.notification.validate()?;
        self.mail.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// AWS client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AwsConfig {
    /// Region override (falls back to the default provider chain)
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible or local testing stacks
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Findings export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Destination bucket for reports
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// KMS key used to encrypt reports (derived from account and region if unset)
    #[serde(default)]
    pub kms_key_arn: Option<String>,

    /// Root of the destination prefix; reports land under `<root>/<YYYY-MM>`
    #[serde(default = "default_key_prefix_root")]
    pub key_prefix_root: String,

    /// Split or full report mode
    #[serde(default)]
    pub mode: ExportMode,

    /// VPC scoping the EC2 report
    #[serde(default)]
    pub vpc_id: Option<String>,

    /// Suffix of report objects
    #[serde(default = "default_report_suffix")]
    pub report_suffix: String,

    /// Seconds between status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum seconds a wait loop keeps polling
    #[serde(default = "default_poll_ceiling_secs")]
    pub poll_ceiling_secs: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("export.bucket cannot be empty".to_string());
        }

        if self.key_prefix_root.trim_matches('/').is_empty() {
            return Err("export.key_prefix_root cannot be empty".to_string());
        }

        if let Some(vpc_id) = &self.vpc_id {
            if vpc_id.trim().is_empty() {
                return Err("export.vpc_id cannot be blank when set".to_string());
            }
        }

        if self.poll_interval_secs == 0 {
            return Err("export.poll_interval_secs must be > 0".to_string());
        }

        if self.poll_ceiling_secs < self.poll_interval_secs {
            return Err(format!(
                "export.poll_ceiling_secs ({}) must be >= export.poll_interval_secs ({})",
                self.poll_ceiling_secs, self.poll_interval_secs
            ));
        }

        Ok(())
    }

    /// The scope id, ignoring blank values
    pub fn scope_id(&self) -> Option<&str> {
        self.vpc_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            kms_key_arn: None,
            key_prefix_root: default_key_prefix_root(),
            mode: ExportMode::default(),
            vpc_id: None,
            report_suffix: default_report_suffix(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_ceiling_secs: default_poll_ceiling_secs(),
        }
    }
}

/// Completion event configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Publish the completion event
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Event bus name
    #[serde(default = "default_event_bus_name")]
    pub event_bus_name: String,

    /// Event source identifier
    #[serde(default = "default_event_source")]
    pub source: String,

    /// Event detail type
    #[serde(default = "default_detail_type")]
    pub detail_type: String,
}

impl NotificationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.event_bus_name.trim().is_empty() {
                return Err("notification.event_bus_name cannot be empty".to_string());
            }
            if self.source.trim().is_empty() {
                return Err("notification.source cannot be empty".to_string());
            }
            if self.detail_type.trim().is_empty() {
                return Err("notification.detail_type cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_bus_name: default_event_bus_name(),
            source: default_event_source(),
            detail_type: default_detail_type(),
        }
    }
}

/// Report mailer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Transactional mail API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API key; read from the parameter store when unset
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Parameter store prefix holding `<prefix>/API_KEY`
    #[serde(default = "default_ssm_parameter_prefix")]
    pub ssm_parameter_prefix: String,

    /// Sender address
    #[serde(default)]
    pub from_email: String,

    /// Sender display name
    #[serde(default)]
    pub from_name: Option<String>,

    /// Comma-separated primary recipients
    #[serde(default)]
    pub to_emails: String,

    /// Comma-separated copy recipients
    #[serde(default)]
    pub cc_emails: String,

    /// Hard payload ceiling of the mail provider
    #[serde(default = "default_provider_limit_bytes")]
    pub provider_limit_bytes: u64,

    /// Reports larger than this are compressed before attaching
    #[serde(default = "default_compression_threshold_bytes")]
    pub compression_threshold_bytes: u64,

    /// Read size of the streaming encoder; must be a multiple of 3
    #[serde(default = "default_chunk_size_bytes")]
    pub chunk_size_bytes: usize,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Tags attached to every message
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Closing line of the message body
    #[serde(default = "default_signature")]
    pub signature: String,
}

impl MailConfig {
    fn validate(&self) -> Result<(), String> {
        if url::Url::parse(&self.api_base_url).is_err() {
            return Err(format!(
                "mail.api_base_url is not a valid URL: {}",
                self.api_base_url
            ));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err("mail.api_base_url must start with http:// or https://".to_string());
        }

        if self.provider_limit_bytes == 0 {
            return Err("mail.provider_limit_bytes must be > 0".to_string());
        }

        if self.compression_threshold_bytes == 0 {
            return Err("mail.compression_threshold_bytes must be > 0".to_string());
        }

        if self.compression_threshold_bytes >= self.provider_limit_bytes {
            return Err(format!(
                "mail.compression_threshold_bytes ({}) must be below mail.provider_limit_bytes ({})",
                self.compression_threshold_bytes, self.provider_limit_bytes
            ));
        }

        if self.chunk_size_bytes == 0 || self.chunk_size_bytes % 3 != 0 {
            return Err(format!(
                "mail.chunk_size_bytes must be a positive multiple of 3, got {}",
                self.chunk_size_bytes
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("mail.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }

    /// Parameter name holding the mail API key
    pub fn api_key_parameter(&self) -> String {
        format!("{}/API_KEY", self.ssm_parameter_prefix.trim_end_matches('/'))
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            ssm_parameter_prefix: default_ssm_parameter_prefix(),
            from_email: String::new(),
            from_name: None,
            to_emails: String::new(),
            cc_emails: String::new(),
            provider_limit_bytes: default_provider_limit_bytes(),
            compression_threshold_bytes: default_compression_threshold_bytes(),
            chunk_size_bytes: default_chunk_size_bytes(),
            timeout_seconds: default_timeout_seconds(),
            tags: default_tags(),
            signature: default_signature(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }

    /// Console-only logging, used by the CLI before a config file is read
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            ..Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bucket() -> String {
    "inspector-exports-bucket".to_string()
}

fn default_key_prefix_root() -> String {
    "inspector-reports".to_string()
}

fn default_report_suffix() -> String {
    ".csv".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_poll_ceiling_secs() -> u64 {
    1800
}

fn default_event_bus_name() -> String {
    "default".to_string()
}

fn default_event_source() -> String {
    "custom.inspector.export".to_string()
}

fn default_detail_type() -> String {
    "Inspector Reports Ready".to_string()
}

fn default_api_base_url() -> String {
    "https://mandrillapp.com/api/1.0".to_string()
}

fn default_ssm_parameter_prefix() -> String {
    "/mailchimp/inspectorreport".to_string()
}

fn default_provider_limit_bytes() -> u64 {
    25 * MIB
}

fn default_compression_threshold_bytes() -> u64 {
    18 * MIB
}

fn default_chunk_size_bytes() -> usize {
    // Largest multiple of 3 not above 1 MiB
    1_048_575
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_tags() -> Vec<String> {
    vec!["inspector-report".to_string(), "security".to_string()]
}

fn default_signature() -> String {
    "DevSecOps Team".to_string()
}

fn default_local_path() -> String {
    "/var/log/vigil".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
