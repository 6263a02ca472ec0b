// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for queue adapter transport events.
//!
//! This module contains message types for logging events related to:
//! * Bounded publish retries and their exhaustion
//! * Receive batches, cancellation and wholesale receive failures
//! * Messages dropped during decoding and dead letters observed by receivers
//! * Acknowledgements that failed and will cause redelivery

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A transient publish failure that will be retried.
///
/// # Log Level
/// `warn!` - Degraded behavior, recovery in progress
///
/// # Example
/// ```
/// use cloudcall::observability::messages::queue::PublishRetrying;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
/// let msg = PublishRetrying {
///     operation: "publish",
///     attempt: 1,
///     max_attempts: 3,
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct PublishRetrying<'a> {
    pub operation: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for PublishRetrying<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} attempt {}/{} failed, retrying: {}",
            self.operation, self.attempt, self.max_attempts, self.error
        )
    }
}

impl StructuredLog for PublishRetrying<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "publish_retrying",
            span_name = name,
            operation = self.operation,
            attempt = self.attempt,
        )
    }
}

/// A receive batch was fetched and decoded.
///
/// # Log Level
/// `debug!` - Routine transport event
pub struct BatchReceived<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
    pub fetched: usize,
    pub delivered: usize,
    pub is_full_batch: bool,
}

impl Display for BatchReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Received {} messages from {} channel '{}' ({} delivered, full_batch={})",
            self.fetched, self.provider, self.channel, self.delivered, self.is_full_batch
        )
    }
}

impl StructuredLog for BatchReceived<'_> {
    fn log(&self) {
        tracing::debug!(
            provider = self.provider,
            channel = self.channel,
            fetched = self.fetched,
            delivered = self.delivered,
            is_full_batch = self.is_full_batch,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch_received",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}

/// A single message in a batch could not be decoded and was dropped.
///
/// # Log Level
/// `warn!` - Data loss limited to one message
///
/// # Example
/// ```
/// use cloudcall::observability::messages::queue::MessageDropped;
///
/// let error = std::io::Error::new(std::io::ErrorKind::InvalidData, "missing callId");
/// let msg = MessageDropped {
///     provider: "pubsub",
///     channel: "projects/p/subscriptions/s",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct MessageDropped<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for MessageDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping undecodable message from {} channel '{}': {}",
            self.provider, self.channel, self.error
        )
    }
}

impl StructuredLog for MessageDropped<'_> {
    fn log(&self) {
        tracing::warn!(
            provider = self.provider,
            channel = self.channel,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "message_dropped",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}

/// A dead letter showed up in a receive batch.
///
/// # Log Level
/// `warn!` - Transport anomaly, never a protocol outcome
pub struct DeadLetterObserved<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
    pub size: usize,
}

impl Display for DeadLetterObserved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unexpected dead letter ({} bytes) on {} channel '{}'",
            self.size, self.provider, self.channel
        )
    }
}

impl StructuredLog for DeadLetterObserved<'_> {
    fn log(&self) {
        tracing::warn!(
            provider = self.provider,
            channel = self.channel,
            size = self.size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "dead_letter_observed",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}

/// A long-poll was cancelled by its owner before the provider answered.
///
/// # Log Level
/// `debug!` - Expected during shutdown
pub struct ReceiveCancelled<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
}

impl Display for ReceiveCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Receive on {} channel '{}' cancelled",
            self.provider, self.channel
        )
    }
}

impl StructuredLog for ReceiveCancelled<'_> {
    fn log(&self) {
        tracing::debug!(provider = self.provider, channel = self.channel, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "receive_cancelled",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}

/// The whole receive call failed; an empty batch is returned instead.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct ReceiveFailed<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ReceiveFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Receive on {} channel '{}' failed: {}",
            self.provider, self.channel, self.error
        )
    }
}

impl StructuredLog for ReceiveFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            provider = self.provider,
            channel = self.channel,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "receive_failed",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}

/// Received messages could not be acknowledged or deleted; they will be redelivered.
///
/// # Log Level
/// `warn!` - Duplicates expected downstream
pub struct AcknowledgeFailed<'a> {
    pub provider: &'a str,
    pub channel: &'a str,
    pub count: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for AcknowledgeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to acknowledge {} messages on {} channel '{}': {}",
            self.count, self.provider, self.channel, self.error
        )
    }
}

impl StructuredLog for AcknowledgeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            provider = self.provider,
            channel = self.channel,
            count = self.count,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "acknowledge_failed",
            span_name = name,
            provider = self.provider,
            channel = self.channel,
        )
    }
}
