// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::api::{AcknowledgeRequest, PubSubApi, PublishRequest, PubsubMessage, PullRequest};
use crate::config::consts::{MAX_BATCH_SIZE, PUBLISH_ATTEMPTS};
use crate::errors::{DecodeError, TransportError};
use crate::observability::messages::{
    queue::{AcknowledgeFailed, ReceiveCancelled, ReceiveFailed},
    StructuredLog,
};
use crate::protocol::{codec, Envelope, Message, PollResult};
use crate::queue::{decode_batch, envelope_size, retry_op, TransportMetrics};
use crate::traits::QueueAdapter;

const PROVIDER: &str = "pubsub";

/// Queue adapter publishing to Pub/Sub topics and pulling from subscriptions.
///
/// `publish` takes a topic resource name; `receive` takes a subscription
/// resource name. Pulled messages are acknowledged before they are decoded.
pub struct PubSubQueue<C> {
    client: C,
    metrics: Arc<TransportMetrics>,
    disposed: CancellationToken,
}

impl<C: PubSubApi> PubSubQueue<C> {
    pub fn new(client: C, metrics: Arc<TransportMetrics>) -> Self {
        Self {
            client,
            metrics,
            disposed: CancellationToken::new(),
        }
    }

    fn cancelled(&self, channel: &str) -> PollResult {
        ReceiveCancelled {
            provider: PROVIDER,
            channel,
        }
        .log();
        PollResult::empty()
    }
}

/// Convert a pulled message into a provider-neutral envelope.
fn to_envelope(message: PubsubMessage) -> Result<Envelope, DecodeError> {
    let body = match message.data.as_deref() {
        Some(data) if !data.is_empty() => codec::decode_base64(data)?,
        _ => Vec::new(),
    };
    let timestamp = message
        .publish_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(Envelope {
        attributes: message.attributes,
        body,
        timestamp,
    })
}

#[async_trait]
impl<C: PubSubApi> QueueAdapter for PubSubQueue<C> {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn dispose(&self) {
        self.disposed.cancel();
    }

    async fn publish(&self, channel: &str, message: &Message) -> Result<(), TransportError> {
        if self.disposed.is_cancelled() {
            return Err(TransportError::Disposed);
        }

        let envelope = message.encode()?;
        let size = envelope_size(&envelope);
        let request = PublishRequest {
            messages: vec![PubsubMessage {
                data: Some(codec::encode_base64(&envelope.body)),
                attributes: envelope.attributes,
                ..Default::default()
            }],
        };

        let response = retry_op(PUBLISH_ATTEMPTS, "publish", |_| {
            self.client.publish(channel, &request)
        })
        .await?;

        self.metrics.record_outbound(size + response.size.total());
        self.metrics.record_published();
        Ok(())
    }

    async fn receive(&self, channel: &str, cancel: &CancellationToken) -> PollResult {
        if cancel.is_cancelled() || self.disposed.is_cancelled() {
            return self.cancelled(channel);
        }

        let request = PullRequest {
            return_immediately: false,
            max_messages: MAX_BATCH_SIZE as u32,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(channel),
            _ = self.disposed.cancelled() => return self.cancelled(channel),
            response = self.client.pull(channel, &request) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                ReceiveFailed {
                    provider: PROVIDER,
                    channel,
                    error: &error,
                }
                .log();
                return PollResult::empty();
            }
        };

        self.metrics.record_outbound(response.size.total());
        self.metrics.record_provider(response.size.billable() * 2);

        let received = response.body.received_messages;
        let ack_ids: Vec<String> = received.iter().filter_map(|m| m.ack_id.clone()).collect();
        if !ack_ids.is_empty() {
            let count = ack_ids.len();
            let ack = AcknowledgeRequest { ack_ids };
            if let Err(error) = self.client.acknowledge(channel, &ack).await {
                AcknowledgeFailed {
                    provider: PROVIDER,
                    channel,
                    count,
                    error: &error,
                }
                .log();
            }
        }

        self.metrics.record_received(received.len() as u64);
        let fetched = received
            .into_iter()
            .map(|m| to_envelope(m.message.unwrap_or_default()))
            .collect();
        decode_batch(PROVIDER, channel, fetched, MAX_BATCH_SIZE)
    }
}
