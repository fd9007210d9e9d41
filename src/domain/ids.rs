//! Domain identifier types with validation
//!
//! Newtype wrappers for the opaque identifiers handed out by external services
//! and for recipient addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Findings report identifier
///
/// Opaque handle returned by the scanning service when a report request is
/// accepted. Used to poll the report status.
///
/// # Examples
///
/// ```
/// use vigil::domain::ids::ReportId;
/// use std::str::FromStr;
///
/// let report_id = ReportId::from_str("a1b2c3d4-report").unwrap();
/// assert_eq!(report_id.as_str(), "a1b2c3d4-report");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    /// Creates a new ReportId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Report ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the report ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ReportId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Email address newtype wrapper
///
/// Only a shape check is performed (`local@domain`); deliverability is the
/// provider's concern and comes back as a delivery outcome.
///
/// # Examples
///
/// ```
/// use vigil::domain::ids::EmailAddress;
///
/// let address = EmailAddress::new(" security@example.com ").unwrap();
/// assert_eq!(address.as_str(), "security@example.com");
/// assert!(EmailAddress::new("not-an-address").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a new EmailAddress, trimming surrounding whitespace
    pub fn new(address: impl Into<String>) -> Result<Self, String> {
        let address = address.into();
        let address = address.trim();
        if address.is_empty() {
            return Err("Email address cannot be empty".to_string());
        }

        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(address.to_string()))
            }
            _ => Err(format!("Invalid email address: {address}")),
        }
    }

    /// Returns the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmailAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Splits a comma-separated address list, dropping blank entries
///
/// # Errors
///
/// Returns the first entry that is not a valid address.
pub fn parse_address_list(raw: &str) -> Result<Vec<EmailAddress>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(EmailAddress::new)
        .collect()
}
