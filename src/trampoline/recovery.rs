// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use super::HostContext;
use crate::errors::{DecodeError, ShapedError};
use crate::observability::messages::{
    trampoline::{CallDecodeFailed, ResponsePublishFailed},
    StructuredLog,
};
use crate::protocol::{codec, FunctionCall, Message};
use crate::traits::QueueAdapter;

/// Error name carried by responses to calls that could not be decoded.
pub const CALL_DECODE_ERROR: &str = "CallDecodeError";

/// Decode a call payload, reporting a failure to the caller when possible.
///
/// A payload that is valid JSON carrying both `callId` and
/// `responseQueueId` gets one error `response` on that channel. Anything
/// less is only logged.
pub(crate) async fn decode_call(
    flavor: &str,
    payload: &[u8],
    queue: &dyn QueueAdapter,
    host: &HostContext,
) -> Option<FunctionCall> {
    let error = match codec::deserialize::<FunctionCall>(payload) {
        Ok(call) => return Some(call),
        Err(error) => error,
    };
    report_undecodable(flavor, payload, &error, queue, host).await;
    None
}

/// Correlation fields that survive a failed typed decode.
fn salvage(payload: &[u8]) -> Option<FunctionCall> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    let call_id = value.get("callId")?.as_str()?;
    let channel = value.get("responseQueueId")?.as_str()?;
    let name = value.get("name").and_then(Value::as_str).unwrap_or_default();
    Some(FunctionCall::new(call_id, name, Vec::new()).with_reply_channel(channel))
}

pub(crate) async fn report_undecodable(
    flavor: &str,
    payload: &[u8],
    error: &DecodeError,
    queue: &dyn QueueAdapter,
    host: &HostContext,
) {
    let salvaged = salvage(payload);
    CallDecodeFailed {
        flavor,
        reply_channel: salvaged.as_ref().and_then(FunctionCall::reply_channel),
        error,
    }
    .log();

    let Some(call) = salvaged else {
        return;
    };
    let Some(channel) = call.response_queue_id.clone() else {
        return;
    };

    let context = host.calling_context(call);
    let response = Message::Response {
        call_id: context.call_id().to_string(),
        body: context.error_return(ShapedError::from_error(CALL_DECODE_ERROR, error)),
    };
    if let Err(publish_error) = queue.publish(&channel, &response).await {
        ResponsePublishFailed {
            call_id: context.call_id(),
            channel: &channel,
            fallback: true,
            error: &publish_error,
        }
        .log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trampoline::testing::RecordingQueue;

    #[tokio::test]
    async fn test_valid_call_decodes() {
        let queue = RecordingQueue::new();
        let payload = br#"{"callId":"42","name":"identity","args":["abc123"],"responseQueueId":"replies"}"#;

        let call = decode_call("test", payload, &queue, &HostContext::new("exec")).await.unwrap();
        assert_eq!(call.call_id, "42");
        assert_eq!(call.reply_channel(), Some("replies"));
        assert!(queue.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_recoverable_failure_reports_once() {
        let queue = RecordingQueue::new();
        // `args` must be an array.
        let payload = br#"{"callId":"42","name":"identity","args":"oops","responseQueueId":"replies"}"#;

        assert!(decode_call("test", payload, &queue, &HostContext::new("exec")).await.is_none());

        let published = queue.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "replies");
        let body = queue.responses().await.remove(0);
        assert_eq!(body.call_id, "42");
        assert_eq!(body.error().unwrap().name, CALL_DECODE_ERROR);
    }

    #[tokio::test]
    async fn test_failure_without_reply_channel_is_only_logged() {
        let queue = RecordingQueue::new();
        let payload = br#"{"callId":"42","args":"oops"}"#;

        assert!(decode_call("test", payload, &queue, &HostContext::new("exec")).await.is_none());
        assert!(queue.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_is_only_logged() {
        let queue = RecordingQueue::new();

        assert!(decode_call("test", b"not json", &queue, &HostContext::new("exec")).await.is_none());
        assert_eq!(queue.response_attempts(), 0);
    }

    #[tokio::test]
    async fn test_recovery_publish_is_not_retried_with_fallback() {
        let queue = RecordingQueue::failing_responses(usize::MAX);
        let payload = br#"{"callId":"42","args":"oops","responseQueueId":"replies"}"#;

        decode_call("test", payload, &queue, &HostContext::new("exec")).await;
        assert_eq!(queue.response_attempts(), 1);
    }
}
