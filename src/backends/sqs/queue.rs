// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use super::api::{SqsApi, SqsMessage, SqsMessageAttribute, SqsOutgoing};
use crate::config::consts::{DEFAULT_LONG_POLL_WAIT_MS, MAX_BATCH_SIZE, PUBLISH_ATTEMPTS};
use crate::errors::TransportError;
use crate::observability::messages::{
    queue::{AcknowledgeFailed, ReceiveCancelled, ReceiveFailed},
    StructuredLog,
};
use crate::protocol::{Attributes, Envelope, Message, PollResult};
use crate::queue::{decode_batch, envelope_size, retry_op, TransportMetrics};
use crate::traits::QueueAdapter;

const PROVIDER: &str = "sqs";

/// SQS rejects empty bodies, so body-less messages carry this instead.
pub const EMPTY_BODY_PLACEHOLDER: &str = "empty";

/// Requests are billed in 64 KiB chunks.
const BILLING_CHUNK_BYTES: u64 = 64 * 1024;

fn billed_bytes(size: u64) -> u64 {
    size.max(1).div_ceil(BILLING_CHUNK_BYTES) * BILLING_CHUNK_BYTES
}

/// Queue adapter over an [`SqsApi`] client. Channels are queue URLs.
pub struct SqsQueue<C> {
    client: C,
    metrics: Arc<TransportMetrics>,
    long_poll_wait: Duration,
    disposed: CancellationToken,
}

impl<C: SqsApi> SqsQueue<C> {
    pub fn new(client: C, metrics: Arc<TransportMetrics>) -> Self {
        Self {
            client,
            metrics,
            long_poll_wait: Duration::from_millis(DEFAULT_LONG_POLL_WAIT_MS),
            disposed: CancellationToken::new(),
        }
    }

    pub fn with_long_poll_wait(mut self, wait: Duration) -> Self {
        self.long_poll_wait = wait;
        self
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

fn to_outgoing(envelope: Envelope) -> SqsOutgoing {
    let body = if envelope.body.is_empty() {
        EMPTY_BODY_PLACEHOLDER.to_string()
    } else {
        String::from_utf8_lossy(&envelope.body).into_owned()
    };
    let attributes = envelope
        .attributes
        .into_iter()
        .map(|(key, value)| (key, SqsMessageAttribute::string(value)))
        .collect();
    SqsOutgoing { body, attributes }
}

fn to_envelope(message: SqsMessage) -> Envelope {
    let attributes: Attributes = message
        .attributes
        .into_iter()
        .map(|(key, attribute)| (key, attribute.string_value))
        .collect();
    let body = if message.body == EMPTY_BODY_PLACEHOLDER {
        Vec::new()
    } else {
        message.body.into_bytes()
    };
    let timestamp = message
        .sent_timestamp
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    Envelope {
        attributes,
        body,
        timestamp,
    }
}

#[async_trait]
impl<C: SqsApi> QueueAdapter for SqsQueue<C> {
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

        let outgoing = to_outgoing(message.encode()?);
        let size = (outgoing.body.len()
            + outgoing
                .attributes
                .iter()
                .map(|(key, attribute)| key.len() + attribute.string_value.len())
                .sum::<usize>()) as u64;

        retry_op(PUBLISH_ATTEMPTS, "send_message", |_| {
            self.client.send_message(channel, &outgoing)
        })
        .await?;

        self.metrics.record_outbound(size);
        self.metrics.record_provider(billed_bytes(size));
        self.metrics.record_published();
        Ok(())
    }

    async fn receive(&self, channel: &str, cancel: &CancellationToken) -> PollResult {
        if cancel.is_cancelled() || self.disposed.is_cancelled() {
            return self.cancelled(channel);
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(channel),
            _ = self.disposed.cancelled() => return self.cancelled(channel),
            fetched = self.client.receive_messages(channel, MAX_BATCH_SIZE, self.long_poll_wait) => fetched,
        };

        let received = match fetched {
            Ok(received) => received,
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

        if !received.is_empty() {
            let handles: Vec<String> = received.iter().map(|m| m.receipt_handle.clone()).collect();
            if let Err(error) = self.client.delete_messages(channel, &handles).await {
                AcknowledgeFailed {
                    provider: PROVIDER,
                    channel,
                    count: handles.len(),
                    error: &error,
                }
                .log();
            }
        }

        let envelopes: Vec<Envelope> = received.into_iter().map(to_envelope).collect();
        let size: u64 = envelopes.iter().map(envelope_size).sum();
        self.metrics.record_outbound(size);
        self.metrics.record_provider(billed_bytes(size));
        self.metrics.record_received(envelopes.len() as u64);

        let fetched = envelopes.into_iter().map(Ok).collect();
        decode_batch(PROVIDER, channel, fetched, MAX_BATCH_SIZE)
    }
}
