//! Findings report request model
//!
//! An [`ExportRequest`] describes one CSV export the scanning service should
//! produce: which findings to include and where in object storage to write
//! them. Requests are immutable once built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource type value used by the scanning service for EC2 instances
pub const EC2_INSTANCE_RESOURCE_TYPE: &str = "AWS_EC2_INSTANCE";

/// Finding status value for open findings
pub const ACTIVE_FINDING_STATUS: &str = "ACTIVE";

/// Which slice of the findings a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Every active finding, unsplit
    Full,
    /// Active findings on EC2 instances inside the configured scope
    ScopedInstances,
    /// Active findings on every resource that is not an EC2 instance
    EverythingElse,
}

impl ReportKind {
    /// Path segment and file-name fragment for this kind
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Full => "all-resources",
            ReportKind::ScopedInstances => "ec2-instances",
            ReportKind::EverythingElse => "non-ec2-resources",
        }
    }

    /// Human readable label used in email bodies
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Full => "All resources",
            ReportKind::ScopedInstances => "EC2 instances",
            ReportKind::EverythingElse => "Non-EC2 resources",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "full" | "all-resources" => Ok(ReportKind::Full),
            "scoped-instances" | "ec2-instances" => Ok(ReportKind::ScopedInstances),
            "everything-else" | "non-ec2-resources" => Ok(ReportKind::EverythingElse),
            other => Err(format!("Unknown report kind: {other}")),
        }
    }
}

/// String comparison operators understood by the filter API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringComparison {
    Equals,
    NotEquals,
    Prefix,
}

/// One string filter clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringFilter {
    pub comparison: StringComparison,
    pub value: String,
}

impl StringFilter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            comparison: StringComparison::Equals,
            value: value.into(),
        }
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        Self {
            comparison: StringComparison::NotEquals,
            value: value.into(),
        }
    }
}

/// Filter criteria attached to a report request
///
/// Empty lists mean "no constraint on this field".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub finding_status: Vec<StringFilter>,
    pub resource_type: Vec<StringFilter>,
    pub ec2_instance_vpc_id: Vec<StringFilter>,
}

/// Where the service should write the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDestination {
    pub bucket: String,
    pub key_prefix: String,
    pub kms_key_arn: String,
}

/// A fully specified export request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub kind: ReportKind,
    pub filter: FilterCriteria,
    pub destination: ReportDestination,
}
