// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::lifecycle::{Invocation, InvocationReport};
use super::recovery::{decode_call, report_undecodable};
use super::HostContext;
use crate::config::TrampolineConfig;
use crate::errors::DecodeError;
use crate::observability::messages::{trampoline::CallDecodeFailed, StructuredLog};
use crate::protocol::codec;
use crate::traits::{QueueAdapter, Wrapper};

const FLAVOR: &str = "push";

/// A subscription push delivery: one call, base64-encoded in `data`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Event metadata delivered alongside a push.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushContext {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub event_type: Option<String>,
}

impl From<PushContext> for HostContext {
    fn from(context: PushContext) -> Self {
        HostContext::new(context.event_id).with_event_timestamp(context.timestamp)
    }
}

/// Runs exactly one pushed call per host invocation.
///
/// The time budget counts from the push event's timestamp, so time spent
/// queued before delivery is deducted from the configured timeout.
pub struct PushTrampoline {
    queue: Arc<dyn QueueAdapter>,
    wrapper: Arc<dyn Wrapper>,
    child_timeout: Option<Duration>,
}

impl PushTrampoline {
    pub fn new(queue: Arc<dyn QueueAdapter>, wrapper: Arc<dyn Wrapper>, cfg: &TrampolineConfig) -> Self {
        Self {
            queue,
            wrapper,
            child_timeout: cfg.child_timeout(),
        }
    }

    /// Handle one push. `None` when the call could not be decoded.
    pub async fn handle(&self, message: PushMessage, host: &HostContext) -> Option<InvocationReport> {
        let payload = match message.data.as_deref().map(codec::decode_base64) {
            Some(Ok(payload)) => payload,
            Some(Err(error)) => {
                CallDecodeFailed {
                    flavor: FLAVOR,
                    reply_channel: None,
                    error: &error,
                }
                .log();
                return None;
            }
            None => {
                CallDecodeFailed {
                    flavor: FLAVOR,
                    reply_channel: None,
                    error: &DecodeError::MissingAttribute("data"),
                }
                .log();
                return None;
            }
        };

        let call = decode_call(FLAVOR, &payload, &*self.queue, host).await?;
        match Invocation::unpack(Arc::clone(&self.queue), call, host, self.child_timeout) {
            Ok(invocation) => Some(invocation.run(FLAVOR, &*self.wrapper).await),
            Err(error) => {
                report_undecodable(FLAVOR, &payload, &error, &*self.queue, host).await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::LocalWrapper;
    use crate::protocol::{FunctionCall, MessageKind};
    use crate::trampoline::testing::RecordingQueue;
    use crate::trampoline::InvocationState;
    use serde_json::json;

    fn trampoline(queue: Arc<RecordingQueue>, child_timeout_ms: Option<u64>) -> PushTrampoline {
        let cfg = TrampolineConfig {
            child_timeout_ms,
            ..Default::default()
        };
        PushTrampoline::new(queue, Arc::new(LocalWrapper::with_builtins()), &cfg)
    }

    fn push(call: &FunctionCall) -> PushMessage {
        PushMessage {
            data: Some(codec::encode_base64(&codec::serialize(call).unwrap())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pushed_call_is_answered() {
        let queue = Arc::new(RecordingQueue::new());
        let call = FunctionCall::new("42", "hello", vec![json!("Andy")]).with_reply_channel("replies");

        let report = trampoline(queue.clone(), None)
            .handle(push(&call), &HostContext::new("event-1"))
            .await
            .unwrap();

        assert_eq!(report.state, InvocationState::Completed);
        let body = queue.responses().await.remove(0);
        assert_eq!(body.value(), Some(&json!("Hello Andy!")));
        assert_eq!(body.execution_id, "event-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_from_event_timestamp() {
        let queue = Arc::new(RecordingQueue::new());
        let call = FunctionCall::new("42", "sleep", vec![json!(20_000)]).with_reply_channel("replies");
        // Published 50s ago with a 60s budget: 10s left, less than the sleep.
        let host = HostContext::new("event-1")
            .with_event_timestamp(Utc::now() - chrono::Duration::seconds(50));

        let report = trampoline(queue.clone(), Some(60_000)).handle(push(&call), &host).await.unwrap();

        assert_eq!(report.state, InvocationState::Failed);
        let body = queue.responses().await.remove(0);
        assert_eq!(body.error().unwrap().name, "TimeoutError");
    }

    #[tokio::test]
    async fn test_missing_data_is_dropped() {
        let queue = Arc::new(RecordingQueue::new());

        let report = trampoline(queue.clone(), None)
            .handle(PushMessage::default(), &HostContext::new("event-1"))
            .await;

        assert!(report.is_none());
        assert!(queue.kinds().await.is_empty());
    }

    #[tokio::test]
    async fn test_call_without_reply_channel_is_dropped() {
        let queue = Arc::new(RecordingQueue::new());
        let call = FunctionCall::new("42", "identity", vec![]);

        let report = trampoline(queue.clone(), None)
            .handle(push(&call), &HostContext::new("event-1"))
            .await;

        assert!(report.is_none());
        assert!(!queue.kinds().await.contains(&MessageKind::Response));
    }

    #[test]
    fn test_push_context_becomes_host_context() {
        let context: PushContext = serde_json::from_value(json!({
            "eventId": "event-9",
            "timestamp": "2024-05-01T12:00:00Z",
            "eventType": "google.pubsub.topic.publish"
        }))
        .unwrap();

        let host = HostContext::from(context);
        assert_eq!(host.execution_id, "event-9");
        assert_eq!(
            host.event_timestamp.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );
    }
}
