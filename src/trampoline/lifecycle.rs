// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::HostContext;
use crate::config::consts::HEARTBEAT_DELAY_MS;
use crate::errors::{shape_error, DecodeError, ShapedError};
use crate::observability::messages::{
    trampoline::{
        HeartbeatPublished, InvocationCompleted, InvocationStarted, ResponsePublishFailed,
        SideMessageFailed, StateTransition,
    },
    StructuredLog,
};
use crate::protocol::{CallingContext, CpuMetrics, FunctionCall, FunctionReturn, Message};
use crate::traits::{CpuUsageHook, ExecutionHooks, QueueAdapter, Wrapper};

/// Error name carried by the fallback response when the real one could not be published.
pub const RESPONSE_PUBLISH_ERROR: &str = "ResponsePublishError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Unpacked,
    Running,
    Completed,
    Failed,
}

impl InvocationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Unpacked => "unpacked",
            InvocationState::Running => "running",
            InvocationState::Completed => "completed",
            InvocationState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationState::Completed | InvocationState::Failed)
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the terminal `response` left the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The response was published.
    Delivered,
    /// The response failed; an error response describing that failure went out instead.
    FallbackDelivered,
    /// Both the response and the fallback failed; the caller will only see a timeout.
    Abandoned,
}

/// Summary of one finished invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationReport {
    pub call_id: String,
    pub state: InvocationState,
    pub publish: PublishOutcome,
}

/// One call's trip through the trampoline, from unpacking to its response.
///
/// Created per call and consumed by [`Invocation::run`]; nothing about it
/// outlives the call.
pub struct Invocation {
    queue: Arc<dyn QueueAdapter>,
    context: CallingContext,
    reply_channel: String,
    timeout: Option<Duration>,
    state: InvocationState,
}

impl Invocation {
    /// Bind a decoded call to its reply channel and time budget.
    pub fn unpack(
        queue: Arc<dyn QueueAdapter>,
        call: FunctionCall,
        host: &HostContext,
        child_timeout: Option<Duration>,
    ) -> Result<Self, DecodeError> {
        let reply_channel = call
            .response_queue_id
            .clone()
            .ok_or_else(|| DecodeError::MissingReplyChannel {
                call_id: call.call_id.clone(),
            })?;

        Ok(Self {
            queue,
            timeout: host.effective_timeout(child_timeout, Utc::now()),
            context: host.calling_context(call),
            reply_channel,
            state: InvocationState::Unpacked,
        })
    }

    pub fn call_id(&self) -> &str {
        self.context.call_id()
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn transition(&mut self, to: InvocationState) {
        StateTransition {
            call_id: self.context.call_id(),
            from: self.state.as_str(),
            to: to.as_str(),
        }
        .log();
        self.state = to;
    }

    /// Execute the call and publish its outcome.
    ///
    /// The heartbeat is cancelled, and its task joined, before the response
    /// is published, so no `functionstarted` from this invocation can follow
    /// the `response` out of the process.
    ///
    /// Everything the invocation logs, its heartbeat and metrics tasks
    /// included, happens inside one `invocation` span.
    pub async fn run(self, flavor: &str, wrapper: &dyn Wrapper) -> InvocationReport {
        let start_msg = InvocationStarted {
            flavor,
            call_id: self.call_id(),
            function: &self.context.call.name,
            timeout: self.timeout,
        };
        let span = start_msg.span("invocation");
        span.in_scope(|| start_msg.log());

        self.execute_and_publish(wrapper).instrument(span).await
    }

    async fn execute_and_publish(mut self, wrapper: &dyn Wrapper) -> InvocationReport {
        let started = Instant::now();
        self.transition(InvocationState::Running);

        let call_id = self.call_id().to_string();
        let heartbeat_cancel = CancellationToken::new();
        let heartbeat = spawn_heartbeat(
            Arc::clone(&self.queue),
            self.reply_channel.clone(),
            call_id.clone(),
            heartbeat_cancel.clone(),
        );

        let side_tasks = TaskTracker::new();
        let hooks = ExecutionHooks {
            cpu_usage: Arc::new(MetricsPublisher {
                queue: Arc::clone(&self.queue),
                channel: self.reply_channel.clone(),
                call_id: call_id.clone(),
                tasks: side_tasks.clone(),
            }),
            override_timeout: self.timeout,
        };

        let result = wrapper.execute(self.context.clone(), hooks).await;

        heartbeat_cancel.cancel();
        if let Err(error) = heartbeat.await {
            tracing::warn!(call_id = %call_id, error = %error, "Heartbeat task did not shut down cleanly");
        }

        let body = match result {
            Ok(value) => {
                self.transition(InvocationState::Completed);
                self.context.returned(value)
            }
            Err(failure) => {
                self.transition(InvocationState::Failed);
                self.context.error_return(shape_error(&failure))
            }
        };

        let publish = publish_response(&*self.queue, &self.reply_channel, &self.context, body).await;

        side_tasks.close();
        side_tasks.wait().await;

        InvocationCompleted {
            call_id: &call_id,
            outcome: self.state.as_str(),
            duration: started.elapsed(),
        }
        .log();

        InvocationReport {
            call_id,
            state: self.state,
            publish,
        }
    }
}

/// Publish `functionstarted` once the heartbeat delay passes, unless cancelled first.
fn spawn_heartbeat(
    queue: Arc<dyn QueueAdapter>,
    channel: String,
    call_id: String,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let heartbeat = async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_millis(HEARTBEAT_DELAY_MS)) => {}
        }

        let message = Message::FunctionStarted {
            call_id: call_id.clone(),
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            result = queue.publish(&channel, &message) => match result {
                Ok(()) => HeartbeatPublished {
                    call_id: &call_id,
                    channel: &channel,
                }
                .log(),
                Err(error) => SideMessageFailed {
                    call_id: &call_id,
                    kind: "functionstarted",
                    error: &error,
                }
                .log(),
            },
        }
    };
    tokio::spawn(heartbeat.in_current_span())
}

/// Forwards CPU samples to the reply channel without blocking the wrapper.
pub(crate) struct MetricsPublisher {
    pub(crate) queue: Arc<dyn QueueAdapter>,
    pub(crate) channel: String,
    pub(crate) call_id: String,
    pub(crate) tasks: TaskTracker,
}

#[async_trait]
impl CpuUsageHook for MetricsPublisher {
    async fn on_cpu_usage(&self, metrics: CpuMetrics) {
        let queue = Arc::clone(&self.queue);
        let channel = self.channel.clone();
        let call_id = self.call_id.clone();

        let publish = async move {
            let message = Message::CpuMetrics {
                call_id: call_id.clone(),
                metrics,
            };
            if let Err(error) = queue.publish(&channel, &message).await {
                SideMessageFailed {
                    call_id: &call_id,
                    kind: "cpumetrics",
                    error: &error,
                }
                .log();
            }
        };
        self.tasks.spawn(publish.in_current_span());
    }
}

/// Drops CPU samples; used when there is no reply channel to send them to.
pub(crate) struct DiscardMetrics;

#[async_trait]
impl CpuUsageHook for DiscardMetrics {
    async fn on_cpu_usage(&self, _metrics: CpuMetrics) {}
}

/// Publish the terminal response, with a single best-effort fallback.
///
/// The adapter already retries transient errors. If the response still
/// cannot be published, one error response describing that failure is
/// attempted; if that fails too it is logged and given up on.
pub(crate) async fn publish_response(
    queue: &dyn QueueAdapter,
    channel: &str,
    context: &CallingContext,
    body: FunctionReturn,
) -> PublishOutcome {
    let call_id = context.call_id();
    let response = Message::Response {
        call_id: call_id.to_string(),
        body,
    };

    let error = match queue.publish(channel, &response).await {
        Ok(()) => return PublishOutcome::Delivered,
        Err(error) => error,
    };
    ResponsePublishFailed {
        call_id,
        channel,
        fallback: false,
        error: &error,
    }
    .log();

    let fallback = Message::Response {
        call_id: call_id.to_string(),
        body: context.error_return(ShapedError::from_error(RESPONSE_PUBLISH_ERROR, &error)),
    };
    match queue.publish(channel, &fallback).await {
        Ok(()) => PublishOutcome::FallbackDelivered,
        Err(error) => {
            ResponsePublishFailed {
                call_id,
                channel,
                fallback: true,
                error: &error,
            }
            .log();
            PublishOutcome::Abandoned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::LocalWrapper;
    use crate::errors::shaping::POSSIBLY_OUT_OF_MEMORY;
    use crate::protocol::MessageKind;
    use crate::trampoline::testing::{RecordingQueue, SpanRecorder};
    use serde_json::{json, Value};

    fn call(name: &str, args: Vec<Value>) -> FunctionCall {
        FunctionCall::new("42", name, args).with_reply_channel("replies")
    }

    async fn run_call(
        queue: Arc<RecordingQueue>,
        wrapper: &LocalWrapper,
        call: FunctionCall,
        child_timeout: Option<Duration>,
    ) -> InvocationReport {
        let invocation =
            Invocation::unpack(queue, call, &HostContext::new("exec-1"), child_timeout).unwrap();
        assert_eq!(invocation.state(), InvocationState::Unpacked);
        invocation.run("test", wrapper).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_invocation_logs_inside_its_span() {
        let recorder = SpanRecorder::default();
        let _guard = recorder.install();
        let queue = Arc::new(RecordingQueue::new());
        let wrapper = LocalWrapper::with_builtins().with_cpu_sample_interval(Duration::from_millis(1000));

        run_call(queue.clone(), &wrapper, call("sleep", vec![json!(2500)]), None).await;

        assert_eq!(recorder.spans(), vec!["invocation"]);
        let event_spans = recorder.event_spans();
        assert!(!event_spans.is_empty());
        // Heartbeat and metrics tasks are spawned, yet still log inside the span.
        assert!(event_spans.iter().all(|span| span.as_deref() == Some("invocation")));
        assert!(queue.kinds().await.contains(&MessageKind::FunctionStarted));
    }

    #[tokio::test]
    async fn test_identity_produces_exactly_one_response() {
        let queue = Arc::new(RecordingQueue::new());
        let report = run_call(
            queue.clone(),
            &LocalWrapper::with_builtins(),
            call("identity", vec![json!("abc123")]),
            None,
        )
        .await;

        assert_eq!(report.state, InvocationState::Completed);
        assert_eq!(report.publish, PublishOutcome::Delivered);

        let published = queue.published().await;
        assert_eq!(published.len(), 1);
        let (channel, message) = &published[0];
        assert_eq!(channel, "replies");
        match message {
            Message::Response { call_id, body } => {
                assert_eq!(call_id, "42");
                assert_eq!(body.call_id, "42");
                assert_eq!(body.value(), Some(&json!("abc123")));
                assert_eq!(body.execution_id, "exec-1");
            }
            other => panic!("Expected response, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_never_publishes_heartbeat() {
        let queue = Arc::new(RecordingQueue::new());
        run_call(queue.clone(), &LocalWrapper::with_builtins(), call("sleep", vec![json!(1500)]), None).await;

        tokio::time::sleep(Duration::from_secs(10)).await;

        let kinds = queue.kinds().await;
        assert_eq!(kinds, vec![MessageKind::Response]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_publishes_heartbeat_before_response() {
        let queue = Arc::new(RecordingQueue::new());
        run_call(queue.clone(), &LocalWrapper::with_builtins(), call("sleep", vec![json!(3000)]), None).await;

        let published = queue.published().await;
        let kinds: Vec<_> = published.iter().map(|(_, m)| m.kind()).collect();
        assert_eq!(kinds, vec![MessageKind::FunctionStarted, MessageKind::Response]);
        assert!(published.iter().all(|(_, m)| m.call_id() == "42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cpu_samples_are_forwarded() {
        let queue = Arc::new(RecordingQueue::new());
        let wrapper = LocalWrapper::with_builtins().with_cpu_sample_interval(Duration::from_millis(500));
        run_call(queue.clone(), &wrapper, call("sleep", vec![json!(1200)]), None).await;

        let kinds = queue.kinds().await;
        let samples = kinds.iter().filter(|k| **k == MessageKind::CpuMetrics).count();
        assert_eq!(samples, 2);
        assert_eq!(kinds.last(), Some(&MessageKind::Response));
    }

    #[tokio::test]
    async fn test_failed_call_still_responds() {
        let queue = Arc::new(RecordingQueue::new());
        let report = run_call(queue.clone(), &LocalWrapper::with_builtins(), call("fail", vec![json!("x")]), None).await;

        assert_eq!(report.state, InvocationState::Failed);
        let body = queue.responses().await.remove(0);
        let error = body.error().unwrap();
        assert_eq!(error.name, "Error");
        assert_eq!(error.message, "Expected this error. Argument: x");
    }

    #[tokio::test]
    async fn test_killed_process_is_reported_as_out_of_memory() {
        let queue = Arc::new(RecordingQueue::new());
        run_call(queue.clone(), &LocalWrapper::with_builtins(), call("crash", vec![]), None).await;

        let body = queue.responses().await.remove(0);
        assert_eq!(body.error().unwrap().name, POSSIBLY_OUT_OF_MEMORY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_timeout_is_enforced() {
        let queue = Arc::new(RecordingQueue::new());
        let report = run_call(
            queue.clone(),
            &LocalWrapper::with_builtins(),
            call("sleep", vec![json!(5000)]),
            Some(Duration::from_millis(1000)),
        )
        .await;

        assert_eq!(report.state, InvocationState::Failed);
        let body = queue.responses().await.remove(0);
        assert_eq!(body.error().unwrap().name, "TimeoutError");
    }

    #[tokio::test]
    async fn test_unreachable_reply_channel_gets_one_fallback() {
        let queue = Arc::new(RecordingQueue::failing_responses(usize::MAX));
        let report = run_call(queue.clone(), &LocalWrapper::with_builtins(), call("identity", vec![json!(1)]), None).await;

        assert_eq!(report.publish, PublishOutcome::Abandoned);
        assert_eq!(queue.response_attempts(), 2);

        let attempts = queue.attempted_responses().await;
        assert!(attempts[0].value().is_some());
        assert_eq!(attempts[1].error().unwrap().name, RESPONSE_PUBLISH_ERROR);
    }

    #[tokio::test]
    async fn test_fallback_delivered_after_first_failure() {
        let queue = Arc::new(RecordingQueue::failing_responses(1));
        let report = run_call(queue.clone(), &LocalWrapper::with_builtins(), call("identity", vec![json!(1)]), None).await;

        assert_eq!(report.publish, PublishOutcome::FallbackDelivered);
        let delivered = queue.responses().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].call_id, "42");
        assert!(delivered[0].is_error());
    }

    #[test]
    fn test_unpack_requires_reply_channel() {
        let queue = Arc::new(RecordingQueue::new());
        let result = Invocation::unpack(
            queue,
            FunctionCall::new("42", "identity", vec![]),
            &HostContext::new("exec"),
            None,
        );
        assert!(matches!(result, Err(DecodeError::MissingReplyChannel { call_id }) if call_id == "42"));
    }
}
