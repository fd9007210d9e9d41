//! Subscriber setup
//!
//! Human-readable events go to stderr so command output on stdout stays
//! machine-readable. With `[logging] local_enabled = true` the same events
//! are also written as JSON lines to `<local_path>/vigil.log`, rotated by
//! `local_rotation`.
//!
//! ```no_run
//! use vigil::config::LoggingConfig;
//! use vigil::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::console_only()).unwrap();
//! ```

use crate::config::LoggingConfig;
use crate::domain::{Result, VigilError};
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "vigil.log";

/// Keeps the file writer alive; dropping it flushes pending lines
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level` when set.
///
/// # Errors
///
/// Returns [`VigilError::Configuration`] for an unknown level or an
/// unusable log directory.
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigil={level}")));

    let (file_writer, guard) = if config.local_enabled {
        let (writer, guard) = file_writer(config)?;
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let json_file = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json_file)
        .init();

    tracing::debug!(
        level = %level,
        file_enabled = config.local_enabled,
        path = %config.local_path,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_writer: guard,
    })
}

fn file_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        VigilError::Configuration(format!(
            "logging.local_path {} is not usable: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        rotation(&config.local_rotation),
        &config.local_path,
        LOG_FILE_NAME,
    );
    Ok(tracing_appender::non_blocking(appender))
}

fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    let name = level.trim();
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid_level(level));
    }
    Level::from_str(name).map_err(|_| invalid_level(level))
}

fn invalid_level(level: &str) -> VigilError {
    VigilError::Configuration(format!(
        "Invalid log level '{level}': expected trace, debug, info, warn or error"
    ))
}
