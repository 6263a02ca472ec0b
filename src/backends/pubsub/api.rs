use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

/// Smallest response size Pub/Sub bills for.
pub const MIN_BILLABLE_BYTES: u64 = 1024;

/// Size of one HTTP response, used for byte accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpSize {
    pub header_bytes: u64,
    pub content_length: u64,
}

impl HttpSize {
    pub fn total(&self) -> u64 {
        self.header_bytes + self.content_length
    }

    /// Content length as billed: headers excluded, 1 KiB minimum.
    pub fn billable(&self) -> u64 {
        self.content_length.max(MIN_BILLABLE_BYTES)
    }
}

/// A decoded response body together with its size on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub body: T,
    pub size: HttpSize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    #[serde(default)]
    pub ack_id: Option<String>,
    #[serde(default)]
    pub message: Option<PubsubMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    #[serde(default)]
    pub received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub return_immediately: bool,
    pub max_messages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(default)]
    pub message_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub ack_ids: Vec<String>,
}

/// The three Pub/Sub REST calls the adapter needs.
///
/// `topic` and `subscription` are full resource names, e.g.
/// `projects/p/topics/t`.
#[async_trait]
pub trait PubSubApi: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        request: &PublishRequest,
    ) -> Result<ApiResponse<PublishResponse>, TransportError>;

    async fn pull(
        &self,
        subscription: &str,
        request: &PullRequest,
    ) -> Result<ApiResponse<PullResponse>, TransportError>;

    async fn acknowledge(
        &self,
        subscription: &str,
        request: &AcknowledgeRequest,
    ) -> Result<(), TransportError>;
}
