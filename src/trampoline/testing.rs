//! Recording queue adapter and span recorder shared by the trampoline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{span, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

use crate::errors::TransportError;
use crate::protocol::{FunctionReturn, Message, MessageKind, PollResult};
use crate::traits::QueueAdapter;

/// Records every publish; optionally fails the first `n` response publishes.
pub(crate) struct RecordingQueue {
    published: Mutex<Vec<(String, Message)>>,
    attempted_responses: Mutex<Vec<FunctionReturn>>,
    response_attempts: AtomicUsize,
    failing_responses: usize,
}

impl RecordingQueue {
    pub(crate) fn new() -> Self {
        Self::failing_responses(0)
    }

    pub(crate) fn failing_responses(count: usize) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            attempted_responses: Mutex::new(Vec::new()),
            response_attempts: AtomicUsize::new(0),
            failing_responses: count,
        }
    }

    /// Successfully published messages, in order.
    pub(crate) async fn published(&self) -> Vec<(String, Message)> {
        self.published.lock().await.clone()
    }

    pub(crate) async fn kinds(&self) -> Vec<MessageKind> {
        self.published.lock().await.iter().map(|(_, m)| m.kind()).collect()
    }

    /// Bodies of successfully published responses.
    pub(crate) async fn responses(&self) -> Vec<FunctionReturn> {
        self.published
            .lock()
            .await
            .iter()
            .filter_map(|(_, m)| match m {
                Message::Response { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bodies of every response publish attempt, failed or not.
    pub(crate) async fn attempted_responses(&self) -> Vec<FunctionReturn> {
        self.attempted_responses.lock().await.clone()
    }

    pub(crate) fn response_attempts(&self) -> usize {
        self.response_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueAdapter for RecordingQueue {
    fn provider(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, channel: &str, message: &Message) -> Result<(), TransportError> {
        if let Message::Response { body, .. } = message {
            let attempt = self.response_attempts.fetch_add(1, Ordering::SeqCst);
            self.attempted_responses.lock().await.push(body.clone());
            if attempt < self.failing_responses {
                return Err(TransportError::network("publish", "reply channel unreachable"));
            }
        }
        self.published
            .lock()
            .await
            .push((channel.to_string(), message.clone()));
        Ok(())
    }

    async fn receive(&self, _channel: &str, _cancel: &CancellationToken) -> PollResult {
        PollResult::empty()
    }
}

/// Records span names and the span each event was emitted in.
#[derive(Clone, Default)]
pub(crate) struct SpanRecorder {
    spans: Arc<std::sync::Mutex<Vec<String>>>,
    event_spans: Arc<std::sync::Mutex<Vec<Option<String>>>>,
}

impl SpanRecorder {
    /// Make this recorder the subscriber for the current thread.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub(crate) fn spans(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }

    pub(crate) fn event_spans(&self) -> Vec<Option<String>> {
        self.event_spans.lock().unwrap().clone()
    }
}

impl<S> Layer<S> for SpanRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
        self.spans.lock().unwrap().push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let span = ctx.event_span(event).map(|span| span.name().to_string());
        self.event_spans.lock().unwrap().push(span);
    }
}
