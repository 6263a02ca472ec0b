use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::TransportError;

/// A string-typed SQS message attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsMessageAttribute {
    pub data_type: String,
    pub string_value: String,
}

impl SqsMessageAttribute {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: value.into(),
        }
    }
}

/// A message about to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SqsOutgoing {
    pub body: String,
    pub attributes: HashMap<String, SqsMessageAttribute>,
}

/// A message returned by a receive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqsMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub attributes: HashMap<String, SqsMessageAttribute>,
    /// `SentTimestamp` system attribute, milliseconds since the epoch.
    pub sent_timestamp: Option<i64>,
}

/// The SQS calls the adapter needs, keyed by queue URL.
#[async_trait]
pub trait SqsApi: Send + Sync {
    async fn send_message(&self, queue_url: &str, message: &SqsOutgoing) -> Result<(), TransportError>;

    /// Long-poll for up to `max_messages`, waiting at most `wait`.
    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<SqsMessage>, TransportError>;

    async fn delete_messages(&self, queue_url: &str, receipt_handles: &[String]) -> Result<(), TransportError>;
}
