//! Mandrill wire types

use crate::domain::{DeliveryOutcome, OutboundMessage};
use serde::{Deserialize, Serialize};

/// Body of `messages/send.json`
#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    pub key: &'a str,
    pub message: &'a OutboundMessage,
}

/// Error document returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

/// Successful send response
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SendResponse(pub Vec<DeliveryOutcome>);
