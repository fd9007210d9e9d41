//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::config::parse_config;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Vigil configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your bucket, VPC and recipients", self.output);
                println!("  2. Store the mail API key in the parameter store, or");
                println!("     set VIGIL_MAIL_API_KEY in a .env file");
                println!("  3. Validate configuration: vigil validate-config");
                println!("  4. Run an export: vigil export --dry-run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Vigil Configuration File
# Monthly Inspector findings export and report mailer

environment = "production"

[application]
log_level = "info"

[export]
bucket = "inspector-reports"
key_prefix_root = "inspector-reports"
mode = "split"
vpc_id = "vpc-0123456789abcdef0"

[notification]
enabled = true
event_bus_name = "default"

[mail]
from_email = "security-reports@example.com"
from_name = "Security Reports"
to_emails = "devsecops@example.com"
cc_emails = ""

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Vigil Configuration File
# Monthly Inspector findings export and report mailer
#
# Values may reference environment variables as ${VAR_NAME}, and any key can
# be overridden with VIGIL_<SECTION>_<KEY> (for example VIGIL_EXPORT_VPC_ID).

# Runtime environment: development | staging | production
environment = "production"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
log_level = "info"

# ============================================================================
# AWS Settings
# ============================================================================
[aws]
# Region override; the default provider chain is used when unset
# region = "us-east-1"

# Custom endpoint for local stacks; enables path-style bucket addressing
# endpoint_url = "http://localhost:4566"

# ============================================================================
# Findings Export
# ============================================================================
[export]
# Bucket receiving the CSV reports
bucket = "inspector-reports"

# KMS key encrypting the reports
# Defaults to arn:aws:kms:<region>:<account>:alias/inspector-export-key
# kms_key_arn = "arn:aws:kms:us-east-1:123456789012:key/..."

# Reports land under <key_prefix_root>/<YYYY-MM>/
key_prefix_root = "inspector-reports"

# split: EC2 instances in vpc_id, then everything else
# full:  one report with every active finding
mode = "split"

# VPC scoping the EC2 report; without it split mode builds the catch-all only
vpc_id = "vpc-0123456789abcdef0"

# Suffix of report objects
report_suffix = ".csv"

# Seconds between status polls, and the longest a wait keeps polling
poll_interval_secs = 30
poll_ceiling_secs = 1800

# ============================================================================
# Completion Event
# ============================================================================
[notification]
enabled = true
event_bus_name = "default"
source = "custom.inspector.export"
detail_type = "Inspector Reports Ready"

# ============================================================================
# Report Mailer
# ============================================================================
[mail]
api_base_url = "https://mandrillapp.com/api/1.0"

# API key; when unset it is read from <ssm_parameter_prefix>/API_KEY
# api_key = "${VIGIL_MANDRILL_KEY}"
ssm_parameter_prefix = "/mailchimp/inspectorreport"

from_email = "security-reports@example.com"
from_name = "Security Reports"

# Comma-separated recipient lists
to_emails = "devsecops@example.com"
cc_emails = "ciso@example.com"

# Provider payload ceiling, and the size above which reports are zipped
provider_limit_bytes = 26214400
compression_threshold_bytes = 18874368

# Streaming read size; must be a multiple of 3
chunk_size_bytes = 1048575

timeout_seconds = 60
tags = ["inspector-report", "security"]
signature = "DevSecOps Team"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "/var/log/vigil"

# Rotation: daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
