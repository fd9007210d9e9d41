//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Vigil using clap.

pub mod commands;

use crate::config::{config_from_env, load_config, VigilConfig};
use crate::domain::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Configuration file read when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_FILE: &str = "vigil.toml";

/// Vigil - monthly Inspector findings export and report mailer
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
#[command(author = "Vigil Contributors")]
pub struct Cli {
    /// Path to configuration file
    ///
    /// Without it, `vigil.toml` is used when present and the environment
    /// otherwise.
    #[arg(short, long, env = "VIGIL_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIGIL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate this month's findings reports and announce them
    Export(commands::export::ExportArgs),

    /// Email the reports named by a completion event
    Send(commands::send::SendArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Load configuration for a command
///
/// # Errors
///
/// Returns a configuration error when the file or environment is invalid.
pub fn resolve_config(path: Option<&str>) -> Result<VigilConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => {
            tracing::debug!("No configuration file, reading settings from the environment");
            config_from_env()
        }
    }
}
