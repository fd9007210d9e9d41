//! Domain error types
//!
//! This module defines the error hierarchy for Vigil.
//! All errors are domain-specific and don't expose third-party SDK types.

use thiserror::Error;

/// Main Vigil error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Findings report export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Event publishing errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Mail delivery errors
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// A supporting cloud service call failed (network, throttling, access)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Findings report export errors
///
/// Errors that occur when talking to the vulnerability scanning service.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another findings report is already being generated
    #[error("Another report is already in progress: {0}")]
    Conflict(String),

    /// The service call failed (network, throttling, server side)
    #[error("Scanning service call failed: {0}")]
    ExternalService(String),

    /// The service answered with something we cannot interpret
    #[error("Invalid response from scanning service: {0}")]
    InvalidResponse(String),
}

impl ExportError {
    /// Whether this is the expected "one report at a time" rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExportError::Conflict(_))
    }
}

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Listing a prefix failed
    #[error("Failed to list objects: {0}")]
    ListFailed(String),

    /// Metadata (HEAD) request failed
    #[error("Failed to read object metadata: {0}")]
    HeadFailed(String),

    /// Download failed
    #[error("Failed to download object: {0}")]
    DownloadFailed(String),

    /// Compressing a downloaded object failed
    #[error("Failed to compress object: {0}")]
    Compression(String),
}

/// Mail delivery errors
///
/// Only transport/API level failures live here; per-recipient rejections are
/// reported as delivery outcomes, not errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// The HTTP call itself failed
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// The provider returned an API error document
    #[error("Mail API error ({status}): {name} - {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },

    /// The provider response could not be parsed
    #[error("Invalid mail API response: {0}")]
    InvalidResponse(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        VigilError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        VigilError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VigilError {
    fn from(err: toml::de::Error) -> Self {
        VigilError::Configuration(format!("TOML parse error: {err}"))
    }
}
