// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_LONG_POLL_WAIT_MS, MAX_BATCH_SIZE, PUBLISH_ATTEMPTS};
use crate::errors::TransportError;
use crate::observability::messages::{queue::ReceiveCancelled, StructuredLog};
use crate::protocol::{Envelope, Message, PollResult};
use crate::queue::{decode_batch, envelope_size, retry_op, TransportMetrics};
use crate::traits::QueueAdapter;

const PROVIDER: &str = "local";

/// In-memory queue adapter with named channels.
///
/// Channels must be created before use; publishing to an unknown channel
/// fails with [`TransportError::ChannelNotFound`]. Receives long-poll until a
/// message arrives, the wait elapses, the caller cancels or the queue is
/// disposed.
pub struct LocalQueue {
    channels: Mutex<HashMap<String, VecDeque<Envelope>>>,
    arrivals: Notify,
    metrics: Arc<TransportMetrics>,
    long_poll_wait: Duration,
    disposed: CancellationToken,
}

impl LocalQueue {
    pub fn new(metrics: Arc<TransportMetrics>) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            arrivals: Notify::new(),
            metrics,
            long_poll_wait: Duration::from_millis(DEFAULT_LONG_POLL_WAIT_MS),
            disposed: CancellationToken::new(),
        }
    }

    pub fn with_long_poll_wait(mut self, wait: Duration) -> Self {
        self.long_poll_wait = wait;
        self
    }

    pub async fn create_channel(&self, channel: &str) {
        self.channels
            .lock()
            .await
            .entry(channel.to_string())
            .or_default();
    }

    /// Enqueue an already-encoded envelope, bypassing message encoding.
    pub async fn publish_raw(&self, channel: &str, envelope: Envelope) -> Result<(), TransportError> {
        if self.disposed.is_cancelled() {
            return Err(TransportError::Disposed);
        }

        let size = envelope_size(&envelope);
        {
            let mut channels = self.channels.lock().await;
            let queue = channels
                .get_mut(channel)
                .ok_or_else(|| TransportError::ChannelNotFound {
                    channel: channel.to_string(),
                })?;
            queue.push_back(envelope);
        }

        self.metrics.record_outbound(size);
        self.metrics.record_provider(size);
        self.metrics.record_published();
        self.arrivals.notify_waiters();
        Ok(())
    }

    /// Messages waiting on `channel`; zero for unknown channels.
    pub async fn len(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .await
            .get(channel)
            .map_or(0, VecDeque::len)
    }

    async fn drain(&self, channel: &str) -> Vec<Envelope> {
        let mut channels = self.channels.lock().await;
        match channels.get_mut(channel) {
            Some(queue) => {
                let take = queue.len().min(MAX_BATCH_SIZE);
                queue.drain(..take).collect()
            }
            None => Vec::new(),
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

#[async_trait]
impl QueueAdapter for LocalQueue {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn dispose(&self) {
        self.disposed.cancel();
    }

    async fn publish(&self, channel: &str, message: &Message) -> Result<(), TransportError> {
        let envelope = message.encode()?;
        retry_op(PUBLISH_ATTEMPTS, "publish", |_| {
            self.publish_raw(channel, envelope.clone())
        })
        .await
    }

    async fn receive(&self, channel: &str, cancel: &CancellationToken) -> PollResult {
        if cancel.is_cancelled() || self.disposed.is_cancelled() {
            return self.cancelled(channel);
        }

        let deadline = Instant::now() + self.long_poll_wait;
        loop {
            // Register interest before draining so a publish in between is not missed.
            let arrived = self.arrivals.notified();
            tokio::pin!(arrived);
            arrived.as_mut().enable();

            let batch = self.drain(channel).await;
            if !batch.is_empty() {
                let size: u64 = batch.iter().map(envelope_size).sum();
                self.metrics.record_outbound(size);
                self.metrics.record_provider(size);
                self.metrics.record_received(batch.len() as u64);
                let fetched = batch.into_iter().map(Ok).collect();
                return decode_batch(PROVIDER, channel, fetched, MAX_BATCH_SIZE);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(channel),
                _ = self.disposed.cancelled() => return self.cancelled(channel),
                _ = tokio::time::sleep_until(deadline) => return PollResult::empty(),
                _ = &mut arrived => {}
            }
        }
    }
}
