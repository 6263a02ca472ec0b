// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Remote-side entry points that turn a host event into an invocation.
//!
//! Every flavor drives the same per-call state machine
//! (`Unpacked -> Running -> Completed | Failed`, see [`Invocation`]):
//!
//! * [`BatchTrampoline`] - a notification batch wrapping one call per record
//! * [`PushTrampoline`] - one base64 call pushed from a subscription
//! * [`HttpsTrampoline`] - a call delivered directly, returned inline
//!
//! Queue flavors publish a `functionstarted` heartbeat if the call is still
//! running after [`HEARTBEAT_DELAY_MS`](crate::config::consts::HEARTBEAT_DELAY_MS),
//! forward CPU samples as `cpumetrics`, and finish with exactly one
//! `response` (plus at most one fallback if that publish fails).
//! [`HostEventRouter`] accepts any raw host event and picks the flavor.

mod batch;
mod event;
mod https;
mod lifecycle;
mod push;
mod recovery;

#[cfg(test)]
mod testing;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::protocol::{CallingContext, FunctionCall};

pub use batch::{BatchTrampoline, Notification, NotificationBatch, NotificationRecord};
pub use event::{HostEvent, HostEventRouter, HostOutcome};
pub use https::HttpsTrampoline;
pub use lifecycle::{Invocation, InvocationReport, InvocationState, PublishOutcome};
pub use push::{PushContext, PushMessage, PushTrampoline};

/// What the host platform tells us about the current execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostContext {
    pub execution_id: String,
    pub log_url: Option<String>,
    pub instance_id: Option<String>,
    /// Execution time the host has left for us, when it reports one.
    pub remaining: Option<Duration>,
    /// When the host event was emitted, for push deliveries.
    pub event_timestamp: Option<DateTime<Utc>>,
}

impl HostContext {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            ..Default::default()
        }
    }

    pub fn with_remaining(mut self, remaining: Duration) -> Self {
        self.remaining = Some(remaining);
        self
    }

    pub fn with_event_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event_timestamp = Some(timestamp);
        self
    }

    pub fn with_log_url(mut self, log_url: impl Into<String>) -> Self {
        self.log_url = Some(log_url.into());
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Stamp a decoded call with this execution's metadata.
    pub fn calling_context(&self, call: FunctionCall) -> CallingContext {
        CallingContext {
            call,
            start_time: Utc::now(),
            execution_id: self.execution_id.clone(),
            log_url: self.log_url.clone(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Time budget handed to the wrapper.
    ///
    /// With an event timestamp, the configured timeout counts from that
    /// timestamp rather than from now. The result is the smaller of that and
    /// whatever the host reports as remaining; `None` when neither is known.
    pub fn effective_timeout(
        &self,
        child_timeout: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let configured = match (self.event_timestamp, child_timeout) {
            (Some(timestamp), Some(timeout)) => Some(time_left(timestamp, timeout, now)),
            (_, timeout) => timeout,
        };

        match (self.remaining, configured) {
            (Some(remaining), Some(configured)) => Some(remaining.min(configured)),
            (remaining, configured) => remaining.or(configured),
        }
    }
}

/// Time from `now` until `start + timeout`, zero once that has passed.
fn time_left(start: DateTime<Utc>, timeout: Duration, now: DateTime<Utc>) -> Duration {
    chrono::Duration::from_std(timeout)
        .ok()
        .and_then(|timeout| start.checked_add_signed(timeout))
        .and_then(|deadline| (deadline - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}
