//! End-to-end tests for the report mailer against a mock mail API

mod common;

use chrono::{TimeZone, Utc};
use common::{MemoryStore, RecordingTransport};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use vigil::adapters::MandrillClient;
use vigil::config::{secret_string, MailConfig, MIB};
use vigil::core::mailer::ReportMailer;
use vigil::domain::{
    ArtifactDescriptor, MailError, MailerTrigger, RecipientKind, RecipientList, ReportKind,
    VigilError,
};

const BUCKET: &str = "security-reports";
const SCOPED_KEY: &str = "reports/2024-05/ec2-instances/report.csv";
const OTHER_KEY: &str = "reports/2024-05/non-ec2-resources/report.csv";

fn mail_config(api_base_url: &str) -> MailConfig {
    MailConfig {
        api_base_url: api_base_url.to_string(),
        api_key: Some(secret_string("md-test-key".to_string())),
        from_email: "security@example.com".to_string(),
        from_name: Some("Security Reports".to_string()),
        to_emails: "ops@example.com, audit@example.com".to_string(),
        cc_emails: "ciso@example.com".to_string(),
        ..Default::default()
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put(BUCKET, SCOPED_KEY, b"resource,severity\ni-1,HIGH\n".to_vec());
    store.put(BUCKET, OTHER_KEY, b"resource,severity\nfn-1,LOW\n".to_vec());
    store
}

fn bundle_trigger() -> MailerTrigger {
    MailerTrigger {
        bucket: Some(BUCKET.to_string()),
        artifacts: vec![
            ArtifactDescriptor {
                report_kind: Some(ReportKind::ScopedInstances),
                key: Some(SCOPED_KEY.to_string()),
                ..Default::default()
            },
            ArtifactDescriptor {
                report_kind: Some(ReportKind::EverythingElse),
                key: Some(OTHER_KEY.to_string()),
                ..Default::default()
            },
        ],
        environment: Some("production".to_string()),
        generated_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bundle_is_mailed_once_through_the_api() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/messages/send.json")
        .match_body(Matcher::PartialJson(json!({
            "key": "md-test-key",
            "message": {
                "subject": "Inspector Report - 2024-05-01",
                "from_email": "security@example.com",
            },
        })))
        .with_status(200)
        .with_body(
            json!([
                {"email": "ops@example.com", "status": "sent", "_id": "a1"},
                {"email": "audit@example.com", "status": "queued", "_id": "a2"},
                {"email": "ciso@example.com", "status": "rejected", "_id": "a3", "reject_reason": "hard-bounce"}
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let config = mail_config(&server.url());
    let transport = Arc::new(MandrillClient::new(&config).unwrap());
    let mailer = ReportMailer::new(config, seeded_store(), transport, None).unwrap();

    let response = mailer.handle(&bundle_trigger()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["accepted"], 2);
    assert_eq!(response.body["test_mode"], false);
    assert_eq!(
        response.body["attachments"],
        json!([
            "inspector-report-ec2-instances-2024-05-01.csv",
            "inspector-report-non-ec2-resources-2024-05-01.csv"
        ])
    );
    assert_eq!(response.body["results"][2]["status"], "rejected");
    assert_eq!(response.body["results"][2]["reject_reason"], "hard-bounce");
}

#[tokio::test]
async fn test_api_error_surfaces_as_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/messages/send.json")
        .with_status(500)
        .with_body(r#"{"status":"error","code":-1,"name":"Invalid_Key","message":"Invalid API key"}"#)
        .create_async()
        .await;

    let config = mail_config(&server.url());
    let transport = Arc::new(MandrillClient::new(&config).unwrap());
    let mailer = ReportMailer::new(config, seeded_store(), transport, None).unwrap();

    let result = mailer.handle(&bundle_trigger()).await;
    match result {
        Err(VigilError::Mail(MailError::Api { status, name, .. })) => {
            assert_eq!(status, 500);
            assert_eq!(name, "Invalid_Key");
        }
        other => panic!("expected a mail API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_test_mode_mails_only_the_override_lists() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = ReportMailer::new(mail_config("http://unused"), seeded_store(), transport.clone(), None)
        .unwrap();

    let trigger = MailerTrigger {
        test_mode: true,
        test_to_emails: Some(RecipientList(vec!["qa@example.com".to_string()])),
        test_cc_emails: Some(RecipientList(vec!["lead@example.com".to_string()])),
        ..bundle_trigger()
    };
    let response = mailer.handle(&trigger).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["test_mode"], true);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.subject, "[TEST] Inspector Report - 2024-05-01");
    let addresses: Vec<_> = message
        .to
        .iter()
        .map(|r| (r.email.as_str().to_string(), r.kind))
        .collect();
    assert_eq!(
        addresses,
        vec![
            ("qa@example.com".to_string(), RecipientKind::To),
            ("lead@example.com".to_string(), RecipientKind::Cc),
        ]
    );
}

#[tokio::test]
async fn test_test_mode_without_override_sends_nothing() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = ReportMailer::new(mail_config("http://unused"), seeded_store(), transport.clone(), None)
        .unwrap();

    let trigger = MailerTrigger {
        test_mode: true,
        test_to_emails: Some(RecipientList(Vec::new())),
        ..bundle_trigger()
    };
    let response = mailer.handle(&trigger).await.unwrap();

    assert_eq!(response.status_code, 400);
    assert_eq!(response.body["error"], "configuration_error");
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_partial_bundle_is_still_mailed() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = ReportMailer::new(mail_config("http://unused"), seeded_store(), transport.clone(), None)
        .unwrap();

    let mut trigger = bundle_trigger();
    trigger.artifacts.truncate(1);
    let response = mailer.handle(&trigger).await.unwrap();

    assert_eq!(response.status_code, 200);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments.len(), 1);
    assert_eq!(sent[0].metadata["s3_key"], SCOPED_KEY);
}

#[tokio::test]
async fn test_storage_notification_trigger_is_mailed() {
    let transport = Arc::new(RecordingTransport::default());
    let mailer = ReportMailer::new(mail_config("http://unused"), seeded_store(), transport.clone(), None)
        .unwrap();

    let trigger = MailerTrigger::from_event(json!({
        "source": "aws.s3",
        "detail-type": "Object Created",
        "detail": {
            "bucket": {"name": BUCKET},
            "object": {"key": "reports/2024-05/ec2-instances/report.csv", "size": 27}
        }
    }))
    .unwrap();
    let response = mailer.handle(&trigger).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(transport.sent()[0].attachments.len(), 1);
}

#[tokio::test]
async fn test_unreadable_artifact_blocks_the_send() {
    let store = seeded_store();
    store.fail_reads_of(OTHER_KEY);
    let transport = Arc::new(RecordingTransport::default());
    let mailer =
        ReportMailer::new(mail_config("http://unused"), store, transport.clone(), None).unwrap();

    let response = mailer.handle(&bundle_trigger()).await.unwrap();

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body["error"], "partial_failure");
    assert_eq!(response.body["prepared"], 1);
    assert_eq!(
        response.body["failed"][0]["artifact"],
        format!("{BUCKET}/{OTHER_KEY}")
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_reports_over_provider_limit_together_are_not_sent() {
    let report = b"resource,severity\n".iter().copied().cycle();
    let at_threshold: Vec<u8> = report.take(18 * MIB as usize).collect();

    let store = Arc::new(MemoryStore::new());
    store.put(BUCKET, SCOPED_KEY, at_threshold.clone());
    store.put(BUCKET, OTHER_KEY, at_threshold);
    let transport = Arc::new(RecordingTransport::default());
    let config = mail_config("http://unused");
    let limit = config.provider_limit_bytes;
    let mailer = ReportMailer::new(config, store, transport.clone(), None).unwrap();

    let response = mailer.handle(&bundle_trigger()).await.unwrap();

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body["error"], "payload_too_large");
    assert_eq!(response.body["limit_bytes"], limit);
    let encoded = response.body["encoded_bytes"].as_u64().unwrap();
    assert_eq!(encoded, 2 * (18 * MIB / 3 * 4));
    assert!(encoded > limit);
    assert!(transport.sent().is_empty());
}
