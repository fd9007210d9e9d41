//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use vigil::config::{config_from_env, load_config, Environment, ExportMode, MIB};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for name in [
        "VIGIL_APPLICATION_LOG_LEVEL",
        "VIGIL_ENVIRONMENT",
        "VIGIL_EXPORT_BUCKET",
        "VIGIL_EXPORT_MODE",
        "VIGIL_EXPORT_VPC_ID",
        "VIGIL_EXPORT_POLL_INTERVAL_SECS",
        "VIGIL_MAIL_API_KEY",
        "VIGIL_MAIL_TO_EMAILS",
        "VIGIL_MAIL_CHUNK_SIZE_BYTES",
        "TEST_VIGIL_MANDRILL_KEY",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
environment = "production"

[application]
log_level = "debug"

[aws]
region = "eu-west-1"
endpoint_url = "http://localhost:4566"

[export]
bucket = "sec-reports"
kms_key_arn = "arn:aws:kms:eu-west-1:123456789012:key/abc"
key_prefix_root = "inspector"
mode = "split"
vpc_id = "vpc-0abc"
poll_interval_secs = 10
poll_ceiling_secs = 600

[notification]
enabled = false

[mail]
api_base_url = "https://mail.example.com/api/1.0"
api_key = "md-key"
from_email = "reports@example.com"
from_name = "Reports"
to_emails = "a@example.com, b@example.com"
cc_emails = "c@example.com"
compression_threshold_bytes = 10485760
tags = ["inspector"]
signature = "Platform Security"

[logging]
local_enabled = false
local_path = "/tmp/vigil"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));

    assert_eq!(config.export.bucket, "sec-reports");
    assert_eq!(config.export.mode, ExportMode::Split);
    assert_eq!(config.export.scope_id(), Some("vpc-0abc"));
    assert_eq!(config.export.poll_ceiling_secs, 600);

    assert!(!config.notification.enabled);

    let api_key = config.mail.api_key.as_ref().expect("api key");
    assert_eq!(api_key.expose_secret().as_ref(), "md-key");
    assert_eq!(config.mail.compression_threshold_bytes, 10 * MIB);
    assert_eq!(config.mail.tags, vec!["inspector"]);

    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[export]\nbucket = \"sec-reports\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.export.mode, ExportMode::Split);
    assert_eq!(config.export.key_prefix_root, "inspector-reports");
    assert_eq!(config.export.report_suffix, ".csv");
    assert!(config.notification.enabled);
    assert_eq!(config.mail.provider_limit_bytes, 25 * MIB);
    assert_eq!(config.mail.compression_threshold_bytes, 18 * MIB);
    assert_eq!(config.mail.chunk_size_bytes, 1_048_575);
    assert!(config.mail.api_key.is_none());
    assert_eq!(
        config.mail.api_key_parameter(),
        "/mailchimp/inspectorreport/API_KEY"
    );
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_VIGIL_MANDRILL_KEY", "substituted-key");

    let temp_file = write_config(
        r#"
[mail]
# api_key = "${NOT_SET_ANYWHERE}"
api_key = "${TEST_VIGIL_MANDRILL_KEY}"
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    let api_key = config.mail.api_key.expect("api key");
    assert_eq!(api_key.expose_secret().as_ref(), "substituted-key");

    cleanup_env_vars();
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("VIGIL_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("VIGIL_EXPORT_MODE", "full");
    std::env::set_var("VIGIL_EXPORT_VPC_ID", "vpc-override");
    std::env::set_var("VIGIL_MAIL_TO_EMAILS", "ops@example.com");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[export]
mode = "split"
vpc_id = "vpc-file"
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.export.mode, ExportMode::Full);
    assert_eq!(config.export.scope_id(), Some("vpc-override"));
    assert_eq!(config.mail.to_emails, "ops@example.com");

    cleanup_env_vars();
}

#[test]
fn test_config_from_env_only() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("VIGIL_ENVIRONMENT", "prod");
    std::env::set_var("VIGIL_EXPORT_BUCKET", "env-bucket");
    std::env::set_var("VIGIL_MAIL_API_KEY", "env-key");

    let config = config_from_env().expect("Failed to build config");

    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.export.bucket, "env-bucket");
    assert!(config.mail.api_key.is_some());

    cleanup_env_vars();
}

#[test]
fn test_invalid_env_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("VIGIL_EXPORT_POLL_INTERVAL_SECS", "soon");

    assert!(config_from_env().is_err());

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for contents in [
        "[application]\nlog_level = \"invalid_level\"\n",
        "[export]\npoll_interval_secs = 60\npoll_ceiling_secs = 30\n",
        "[mail]\ncompression_threshold_bytes = 30000000\n",
        "[mail]\nchunk_size_bytes = 1048576\n",
        "[logging]\nlocal_rotation = \"size\"\n",
    ] {
        let temp_file = write_config(contents);
        assert!(
            load_config(temp_file.path()).is_err(),
            "expected rejection of {contents}"
        );
    }
}
