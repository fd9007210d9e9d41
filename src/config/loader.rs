//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, ExportMode, VigilConfig};
use super::secret::secret_string;
use crate::domain::errors::VigilError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VigilConfig
/// 4. Applies environment variable overrides (VIGIL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use vigil::config::loader::load_config;
///
/// let config = load_config("vigil.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VigilConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VigilError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VigilError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
pub fn parse_config(contents: &str) -> Result<VigilConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: VigilConfig = toml::from_str(&contents)
        .map_err(|e| VigilError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VigilError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Configuration built from defaults and `VIGIL_*` variables only
///
/// Used when no configuration file is given, which is the normal shape of a
/// scheduled function deployment.
pub fn config_from_env() -> Result<VigilConfig> {
    let mut config = VigilConfig::default();
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VigilError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VigilError::Other(format!("Invalid substitution pattern: {}", e)))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(VigilError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            VigilError::Configuration(format!("Invalid value for {}: '{}'", name, val))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using VIGIL_* prefix
///
/// Environment variables follow the pattern: VIGIL_<SECTION>_<KEY>
/// For example: VIGIL_EXPORT_BUCKET, VIGIL_MAIL_TO_EMAILS
fn apply_env_overrides(config: &mut VigilConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("VIGIL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("VIGIL_ENVIRONMENT") {
        config.environment = match val.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            other => {
                return Err(VigilError::Configuration(format!(
                    "Invalid VIGIL_ENVIRONMENT '{}'",
                    other
                )))
            }
        };
    }

    // AWS overrides
    if let Ok(val) = std::env::var("VIGIL_AWS_REGION") {
        config.aws.region = Some(val);
    }
    if let Ok(val) = std::env::var("VIGIL_AWS_ENDPOINT_URL") {
        config.aws.endpoint_url = Some(val);
    }

    // Export overrides
    if let Ok(val) = std::env::var("VIGIL_EXPORT_BUCKET") {
        config.export.bucket = val;
    }
    if let Ok(val) = std::env::var("VIGIL_EXPORT_KMS_KEY_ARN") {
        config.export.kms_key_arn = Some(val);
    }
    if let Ok(val) = std::env::var("VIGIL_EXPORT_KEY_PREFIX_ROOT") {
        config.export.key_prefix_root = val;
    }
    if let Ok(val) = std::env::var("VIGIL_EXPORT_MODE") {
        config.export.mode = match val.to_lowercase().as_str() {
            "split" => ExportMode::Split,
            "full" => ExportMode::Full,
            other => {
                return Err(VigilError::Configuration(format!(
                    "Invalid VIGIL_EXPORT_MODE '{}'. Must be 'split' or 'full'",
                    other
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("VIGIL_EXPORT_VPC_ID") {
        config.export.vpc_id = Some(val);
    }
    if let Some(secs) = parse_env("VIGIL_EXPORT_POLL_INTERVAL_SECS")? {
        config.export.poll_interval_secs = secs;
    }
    if let Some(secs) = parse_env("VIGIL_EXPORT_POLL_CEILING_SECS")? {
        config.export.poll_ceiling_secs = secs;
    }

    // Notification overrides
    if let Some(enabled) = parse_env("VIGIL_NOTIFICATION_ENABLED")? {
        config.notification.enabled = enabled;
    }
    if let Ok(val) = std::env::var("VIGIL_NOTIFICATION_EVENT_BUS_NAME") {
        config.notification.event_bus_name = val;
    }

    // Mail overrides
    if let Ok(val) = std::env::var("VIGIL_MAIL_API_BASE_URL") {
        config.mail.api_base_url = val;
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_API_KEY") {
        config.mail.api_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_SSM_PARAMETER_PREFIX") {
        config.mail.ssm_parameter_prefix = val;
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_FROM_EMAIL") {
        config.mail.from_email = val;
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_FROM_NAME") {
        config.mail.from_name = Some(val);
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_TO_EMAILS") {
        config.mail.to_emails = val;
    }
    if let Ok(val) = std::env::var("VIGIL_MAIL_CC_EMAILS") {
        config.mail.cc_emails = val;
    }
    if let Some(bytes) = parse_env("VIGIL_MAIL_COMPRESSION_THRESHOLD_BYTES")? {
        config.mail.compression_threshold_bytes = bytes;
    }
    if let Some(bytes) = parse_env("VIGIL_MAIL_CHUNK_SIZE_BYTES")? {
        config.mail.chunk_size_bytes = bytes;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("VIGIL_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("VIGIL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
