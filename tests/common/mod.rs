//! In-memory fakes of the adapter traits shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use vigil::adapters::{BusEvent, EventPublisher, MailTransport, ObjectReader, ObjectStore, ObjectSummary};
use vigil::config::SecretString;
use vigil::domain::{
    DeliveryOutcome, DeliveryStatus, OutboundMessage, Result, StorageError, VigilError,
};

#[derive(Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
}

/// Bucket/key map with call counters and injectable download failures
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing: Mutex<HashSet<String>>,
    pub size_lookups: Mutex<u32>,
    pub full_downloads: Mutex<u32>,
    pub streamed_reads: Mutex<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.put_at(bucket, key, body, None);
    }

    pub fn put_at(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                last_modified,
            },
        );
    }

    /// Make every read of `key` fail
    pub fn fail_reads_of(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    fn object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::DownloadFailed(format!("injected failure for {key}")).into());
        }
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{bucket}/{key}")).into())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), o)| ObjectSummary {
                key: k.clone(),
                size: o.body.len() as u64,
                last_modified: o.last_modified,
            })
            .collect())
    }

    async fn object_size(&self, bucket: &str, key: &str) -> Result<u64> {
        *self.size_lookups.lock().unwrap() += 1;
        Ok(self.object(bucket, key)?.body.len() as u64)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        *self.full_downloads.lock().unwrap() += 1;
        Ok(self.object(bucket, key)?.body)
    }

    async fn open_object(&self, bucket: &str, key: &str) -> Result<ObjectReader> {
        *self.streamed_reads.lock().unwrap() += 1;
        let body = self.object(bucket, key)?.body;
        Ok(Box::pin(std::io::Cursor::new(body)))
    }
}

/// Keeps every published event; optionally rejects them all
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<BusEvent>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &BusEvent) -> Result<()> {
        if self.fail {
            return Err(VigilError::Notification("bus unavailable".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Keeps every message and answers `sent` for each recipient
#[derive(Default)]
pub struct RecordingTransport {
    pub messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        _api_key: &SecretString,
        message: &OutboundMessage,
    ) -> Result<Vec<DeliveryOutcome>> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(message
            .to
            .iter()
            .map(|r| DeliveryOutcome {
                email: r.email.as_str().to_string(),
                status: DeliveryStatus::Sent,
                provider_id: None,
                reject_reason: None,
            })
            .collect())
    }
}
