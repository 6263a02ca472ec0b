// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for trampoline invocation lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Call unpacking and decode failures
//! * Invocation start, state transitions and completion
//! * Heartbeat and CPU metrics side messages
//! * Response publishing and the single best-effort fallback

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Invocation unpacked and about to run.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use cloudcall::observability::messages::trampoline::InvocationStarted;
/// use std::time::Duration;
///
/// let msg = InvocationStarted {
///     flavor: "push",
///     call_id: "42",
///     function: "identity",
///     timeout: Some(Duration::from_secs(30)),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct InvocationStarted<'a> {
    pub flavor: &'a str,
    pub call_id: &'a str,
    pub function: &'a str,
    pub timeout: Option<Duration>,
}

impl Display for InvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.timeout {
            Some(timeout) => write!(
                f,
                "Invocation '{}' of '{}' started ({} trampoline, timeout={:?})",
                self.call_id, self.function, self.flavor, timeout
            ),
            None => write!(
                f,
                "Invocation '{}' of '{}' started ({} trampoline, no deadline)",
                self.call_id, self.function, self.flavor
            ),
        }
    }
}

impl StructuredLog for InvocationStarted<'_> {
    fn log(&self) {
        tracing::info!(
            flavor = self.flavor,
            call_id = self.call_id,
            function = self.function,
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "invocation",
            span_name = name,
            flavor = self.flavor,
            call_id = self.call_id,
            function = self.function,
        )
    }
}

/// Invocation reached a terminal state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InvocationCompleted<'a> {
    pub call_id: &'a str,
    pub outcome: &'a str,
    pub duration: Duration,
}

impl Display for InvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invocation '{}' finished with outcome '{}' in {:?}",
            self.call_id, self.outcome, self.duration
        )
    }
}

impl StructuredLog for InvocationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            call_id = self.call_id,
            outcome = self.outcome,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "invocation_completed",
            span_name = name,
            call_id = self.call_id,
            outcome = self.outcome,
        )
    }
}

/// Lifecycle state change of one invocation.
///
/// # Log Level
/// `debug!` - Internal detail
pub struct StateTransition<'a> {
    pub call_id: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

impl Display for StateTransition<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Invocation '{}': {} -> {}", self.call_id, self.from, self.to)
    }
}

impl StructuredLog for StateTransition<'_> {
    fn log(&self) {
        tracing::debug!(call_id = self.call_id, from = self.from, to = self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("state_transition", span_name = name, call_id = self.call_id)
    }
}

/// Heartbeat (`functionstarted`) published.
///
/// # Log Level
/// `debug!` - Routine side message
pub struct HeartbeatPublished<'a> {
    pub call_id: &'a str,
    pub channel: &'a str,
}

impl Display for HeartbeatPublished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Published heartbeat for '{}' to '{}'",
            self.call_id, self.channel
        )
    }
}

impl StructuredLog for HeartbeatPublished<'_> {
    fn log(&self) {
        tracing::debug!(call_id = self.call_id, channel = self.channel, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("heartbeat", span_name = name, call_id = self.call_id)
    }
}

/// An advisory side message (heartbeat or CPU metrics) could not be published.
///
/// # Log Level
/// `warn!` - Advisory data lost, never escalated
pub struct SideMessageFailed<'a> {
    pub call_id: &'a str,
    pub kind: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SideMessageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to publish {} message for '{}': {}",
            self.kind, self.call_id, self.error
        )
    }
}

impl StructuredLog for SideMessageFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            call_id = self.call_id,
            kind = self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "side_message_failed",
            span_name = name,
            call_id = self.call_id,
            kind = self.kind,
        )
    }
}

/// The terminal response could not be published after all retries.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use cloudcall::observability::messages::trampoline::ResponsePublishFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "queue unreachable");
/// let msg = ResponsePublishFailed {
///     call_id: "42",
///     channel: "replies",
///     fallback: false,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ResponsePublishFailed<'a> {
    pub call_id: &'a str,
    pub channel: &'a str,
    pub fallback: bool,
    pub error: &'a dyn std::error::Error,
}

impl Display for ResponsePublishFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let which = if self.fallback { "fallback error response" } else { "response" };
        write!(
            f,
            "Failed to publish {} for '{}' to '{}': {}",
            which, self.call_id, self.channel, self.error
        )
    }
}

impl StructuredLog for ResponsePublishFailed<'_> {
    fn log(&self) {
        if self.fallback {
            tracing::warn!(
                call_id = self.call_id,
                channel = self.channel,
                error = %self.error,
                "{}", self
            );
        } else {
            tracing::error!(
                call_id = self.call_id,
                channel = self.channel,
                error = %self.error,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "response_publish_failed",
            span_name = name,
            call_id = self.call_id,
            channel = self.channel,
        )
    }
}

/// An incoming call could not be decoded.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CallDecodeFailed<'a> {
    pub flavor: &'a str,
    pub reply_channel: Option<&'a str>,
    pub error: &'a dyn std::error::Error,
}

impl Display for CallDecodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.reply_channel {
            Some(channel) => write!(
                f,
                "Failed to decode call in {} trampoline, reporting to '{}': {}",
                self.flavor, channel, self.error
            ),
            None => write!(
                f,
                "Failed to decode call in {} trampoline, no reply channel recoverable: {}",
                self.flavor, self.error
            ),
        }
    }
}

impl StructuredLog for CallDecodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            flavor = self.flavor,
            reply_channel = self.reply_channel,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("call_decode_failed", span_name = name, flavor = self.flavor)
    }
}
