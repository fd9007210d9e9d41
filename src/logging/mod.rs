//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output, always on
//! - JSON files with daily or hourly rotation when `logging.local_enabled`
//! - `RUST_LOG` overriding the configured level
//!
//! # Example
//!
//! ```no_run
//! use vigil::logging::init_logging;
//! use vigil::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(report_id = "rpt-1", "Report submitted");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a report status transition
///
/// # Example
///
/// ```no_run
/// use vigil::log_report_transition;
///
/// log_report_transition!("rpt-1", "ec2-instances", "IN_PROGRESS", "SUCCEEDED");
/// ```
#[macro_export]
macro_rules! log_report_transition {
    ($report_id:expr, $kind:expr, $from:expr, $to:expr) => {
        tracing::info!(
            report_id = %$report_id,
            kind = %$kind,
            from = %$from,
            to = %$to,
            "Report status changed"
        );
    };
}

/// Log an error with context
///
/// ```no_run
/// use vigil::log_error_with_context;
/// use vigil::domain::VigilError;
///
/// let error = VigilError::Configuration("export.bucket is empty".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::VigilError;

    #[test]
    fn test_macros_expand_without_subscriber() {
        log_report_transition!("rpt-1", "full", "PENDING", "IN_PROGRESS");
        let error = VigilError::Other("boom".to_string());
        log_error_with_context!(&error, "while testing");
    }
}
