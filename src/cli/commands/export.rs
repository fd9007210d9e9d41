//! Export command implementation
//!
//! Runs one monthly findings export: build the requests, submit them one at a
//! time, wait for every report, locate the files and publish the completion
//! event.

use super::print_response;
use crate::adapters::{
    aws, AccountIdentity, EventBridgePublisher, InspectorReportService, S3ObjectStore,
    StsIdentity,
};
use crate::cli::resolve_config;
use crate::config::ExportMode;
use crate::core::export::{build_requests, ExportCoordinator, RunContext};
use crate::core::response::InvocationResponse;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

/// Region used when neither configuration nor the provider chain supplies one
const FALLBACK_REGION: &str = "us-east-1";

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Print the requests that would be submitted without submitting them
    #[arg(long)]
    pub dry_run: bool,

    /// Override export mode (split or full)
    #[arg(long)]
    pub mode: Option<String>,

    /// Override the VPC that scopes the EC2 report
    #[arg(long)]
    pub vpc_id: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                print_response(&InvocationResponse::configuration_error(e.to_string()))?;
                return Ok(2);
            }
        };

        if let Some(mode) = &self.mode {
            config.export.mode = match mode.to_lowercase().as_str() {
                "split" => ExportMode::Split,
                "full" => ExportMode::Full,
                _ => {
                    eprintln!("Invalid export mode: {mode}. Use 'split' or 'full'");
                    return Ok(2);
                }
            };
            tracing::info!(mode = ?config.export.mode, "Overriding export mode from CLI");
        }

        if let Some(vpc_id) = &self.vpc_id {
            tracing::info!(vpc_id = %vpc_id, "Overriding VPC scope from CLI");
            config.export.vpc_id = Some(vpc_id.clone());
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            print_response(&InvocationResponse::configuration_error(e))?;
            return Ok(2);
        }

        let sdk_config = aws::load_sdk_config(&config.aws).await;

        let account_id = match StsIdentity::new(&sdk_config).account_id().await {
            Ok(id) => id,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to resolve caller account");
                print_response(&InvocationResponse::failure(
                    serde_json::json!({ "error": "identity", "message": e.to_string() }),
                ))?;
                return Ok(4);
            }
        };

        let ctx = RunContext {
            account_id,
            region: aws::region_name(&sdk_config).unwrap_or_else(|| FALLBACK_REGION.to_string()),
            environment: config.environment.as_str().to_string(),
        };

        if self.dry_run {
            let requests = build_requests(&config.export, &ctx, Utc::now());
            tracing::info!(requests = requests.len(), "Dry run, nothing submitted");
            println!("{}", serde_json::to_string_pretty(&requests)?);
            return Ok(0);
        }

        let path_style = config.aws.endpoint_url.is_some();
        let coordinator = ExportCoordinator::new(
            &config,
            ctx,
            Arc::new(InspectorReportService::new(&sdk_config)),
            Arc::new(S3ObjectStore::new(&sdk_config, path_style)),
            Arc::new(EventBridgePublisher::new(&sdk_config)),
        );

        let summary = match coordinator.run(Utc::now()).await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Export failed");
                print_response(&InvocationResponse::failure(
                    serde_json::json!({ "error": "export_failed", "message": e.to_string() }),
                ))?;
                return Ok(5);
            }
        };

        print_response(&summary.to_response())?;
        Ok(summary.exit_code())
    }
}
