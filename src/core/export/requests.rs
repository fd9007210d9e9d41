//! Report request builder
//!
//! Turns the export configuration and the current date into the ordered list
//! of requests for one monthly run. In split mode the scoped EC2 request, when
//! a scope is configured, always comes before the catch-all request because
//! the service allows only one report in flight at a time.

use crate::config::{ExportConfig, ExportMode};
use crate::domain::report::{
    ExportRequest, FilterCriteria, ReportDestination, ReportKind, StringFilter,
    ACTIVE_FINDING_STATUS, EC2_INSTANCE_RESOURCE_TYPE,
};
use chrono::{DateTime, Utc};

/// Account and environment facts a run needs beyond the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub account_id: String,
    pub region: String,
    pub environment: String,
}

impl RunContext {
    /// KMS key ARN used when none is configured
    pub fn default_kms_key_arn(&self) -> String {
        format!(
            "arn:aws:kms:{}:{}:alias/inspector-export-key",
            self.region, self.account_id
        )
    }
}

/// Reporting period of a run, `YYYY-MM`
pub fn period(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Destination prefix of a run, `<root>/<YYYY-MM>`
pub fn period_prefix(root: &str, now: DateTime<Utc>) -> String {
    format!("{}/{}", root.trim_matches('/'), period(now))
}

/// Build the ordered export requests for one run
pub fn build_requests(
    config: &ExportConfig,
    ctx: &RunContext,
    now: DateTime<Utc>,
) -> Vec<ExportRequest> {
    let base_prefix = period_prefix(&config.key_prefix_root, now);
    let kms_key_arn = config
        .kms_key_arn
        .clone()
        .unwrap_or_else(|| ctx.default_kms_key_arn());

    let destination = |key_prefix: String| ReportDestination {
        bucket: config.bucket.clone(),
        key_prefix,
        kms_key_arn: kms_key_arn.clone(),
    };
    let active = || vec![StringFilter::equals(ACTIVE_FINDING_STATUS)];

    match config.mode {
        ExportMode::Full => vec![ExportRequest {
            kind: ReportKind::Full,
            filter: FilterCriteria {
                finding_status: active(),
                ..Default::default()
            },
            destination: destination(base_prefix),
        }],
        ExportMode::Split => {
            let mut requests = Vec::with_capacity(2);

            if let Some(scope_id) = config.scope_id() {
                let kind = ReportKind::ScopedInstances;
                requests.push(ExportRequest {
                    kind,
                    filter: FilterCriteria {
                        finding_status: active(),
                        resource_type: vec![StringFilter::equals(EC2_INSTANCE_RESOURCE_TYPE)],
                        ec2_instance_vpc_id: vec![StringFilter::equals(scope_id)],
                    },
                    destination: destination(format!("{}/{}", base_prefix, kind.slug())),
                });
            }

            let kind = ReportKind::EverythingElse;
            requests.push(ExportRequest {
                kind,
                filter: FilterCriteria {
                    finding_status: active(),
                    resource_type: vec![StringFilter::not_equals(EC2_INSTANCE_RESOURCE_TYPE)],
                    ec2_instance_vpc_id: Vec::new(),
                },
                destination: destination(format!("{}/{}", base_prefix, kind.slug())),
            });

            requests
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::StringComparison;
    use chrono::TimeZone;

    fn ctx() -> RunContext {
        RunContext {
            account_id: "123456789012".to_string(),
            region: "eu-west-1".to_string(),
            environment: "production".to_string(),
        }
    }

    fn may_2024() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_period_prefix() {
        assert_eq!(period(may_2024()), "2024-05");
        assert_eq!(
            period_prefix("/inspector-reports/", may_2024()),
            "inspector-reports/2024-05"
        );
    }

    #[test]
    fn test_split_with_scope_orders_scoped_first() {
        let config = ExportConfig {
            vpc_id: Some("vpc-0abc".to_string()),
            ..Default::default()
        };

        let requests = build_requests(&config, &ctx(), may_2024());
        assert_eq!(requests.len(), 2);

        let scoped = &requests[0];
        assert_eq!(scoped.kind, ReportKind::ScopedInstances);
        assert_eq!(
            scoped.destination.key_prefix,
            "inspector-reports/2024-05/ec2-instances"
        );
        assert_eq!(scoped.filter.ec2_instance_vpc_id[0].value, "vpc-0abc");
        assert_eq!(scoped.filter.resource_type[0].value, "AWS_EC2_INSTANCE");
        assert_eq!(
            scoped.filter.resource_type[0].comparison,
            StringComparison::Equals
        );

        let rest = &requests[1];
        assert_eq!(rest.kind, ReportKind::EverythingElse);
        assert_eq!(
            rest.destination.key_prefix,
            "inspector-reports/2024-05/non-ec2-resources"
        );
        assert_eq!(
            rest.filter.resource_type[0].comparison,
            StringComparison::NotEquals
        );
        assert!(rest.filter.ec2_instance_vpc_id.is_empty());
    }

    #[test]
    fn test_split_without_scope_builds_catch_all_only() {
        let requests = build_requests(&ExportConfig::default(), &ctx(), may_2024());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, ReportKind::EverythingElse);
    }

    #[test]
    fn test_every_request_filters_active_findings() {
        let config = ExportConfig {
            vpc_id: Some("vpc-1".to_string()),
            ..Default::default()
        };
        for request in build_requests(&config, &ctx(), may_2024()) {
            assert_eq!(request.filter.finding_status.len(), 1);
            assert_eq!(request.filter.finding_status[0].value, "ACTIVE");
        }
    }

    #[test]
    fn test_full_mode_single_request() {
        let config = ExportConfig {
            mode: ExportMode::Full,
            vpc_id: Some("vpc-ignored".to_string()),
            ..Default::default()
        };

        let requests = build_requests(&config, &ctx(), may_2024());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, ReportKind::Full);
        assert_eq!(requests[0].destination.key_prefix, "inspector-reports/2024-05");
        assert!(requests[0].filter.resource_type.is_empty());
    }

    #[test]
    fn test_kms_key_default_and_override() {
        let requests = build_requests(&ExportConfig::default(), &ctx(), may_2024());
        assert_eq!(
            requests[0].destination.kms_key_arn,
            "arn:aws:kms:eu-west-1:123456789012:alias/inspector-export-key"
        );

        let config = ExportConfig {
            kms_key_arn: Some("arn:aws:kms:eu-west-1:1:key/abc".to_string()),
            ..Default::default()
        };
        let requests = build_requests(&config, &ctx(), may_2024());
        assert_eq!(
            requests[0].destination.kms_key_arn,
            "arn:aws:kms:eu-west-1:1:key/abc"
        );
        assert_eq!(requests[0].destination.bucket, "inspector-exports-bucket");
    }
}
