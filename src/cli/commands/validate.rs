//! Validate config command implementation
//!
//! Loads and validates the configuration, then prints a summary without
//! contacting any external service.

use crate::cli::resolve_config;
use crate::config::ExportMode;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let source = config_path.unwrap_or("default sources");
        tracing::info!(config_path = %source, "Validating configuration");

        println!("🔍 Validating configuration: {source}");
        println!();

        // load_config and config_from_env both validate
        let config = match resolve_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {}", config.environment.as_str());
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Region: {}",
            config.aws.region.as_deref().unwrap_or("(provider chain)")
        );
        println!("  Report Bucket: {}", config.export.bucket);
        println!("  Prefix Root: {}", config.export.key_prefix_root);
        match (config.export.mode, config.export.scope_id()) {
            (ExportMode::Full, _) => println!("  Export Mode: full"),
            (ExportMode::Split, Some(vpc)) => println!("  Export Mode: split (EC2 in {vpc})"),
            (ExportMode::Split, None) => println!("  Export Mode: split (catch-all only)"),
        }
        println!(
            "  Polling: every {}s, up to {}s",
            config.export.poll_interval_secs, config.export.poll_ceiling_secs
        );
        if config.notification.enabled {
            println!(
                "  Completion Event: {} on {}",
                config.notification.detail_type, config.notification.event_bus_name
            );
        } else {
            println!("  Completion Event: disabled");
        }
        println!("  Mail API: {}", config.mail.api_base_url);
        println!(
            "  Mail API Key: {}",
            if config.mail.api_key.is_some() {
                "configured".to_string()
            } else {
                format!("from parameter {}", config.mail.api_key_parameter())
            }
        );
        println!("  Sender: {}", display_or_unset(&config.mail.from_email));
        println!("  To: {}", display_or_unset(&config.mail.to_emails));
        println!(
            "  Compression Above: {} bytes",
            config.mail.compression_threshold_bytes
        );
        println!();

        Ok(0)
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(unset)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_good_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "[export]\nbucket = \"reports\"\nvpc_id = \"vpc-1\"\n").unwrap();

        let code = ValidateArgs {}.execute(path.to_str()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_bad_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "[export]\npoll_interval_secs = 0\n").unwrap();

        let code = ValidateArgs {}.execute(path.to_str()).await.unwrap();
        assert_eq!(code, 2);
    }
}
