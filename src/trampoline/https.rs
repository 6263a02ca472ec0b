// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::lifecycle::{DiscardMetrics, MetricsPublisher};
use super::HostContext;
use crate::config::TrampolineConfig;
use crate::errors::shape_error;
use crate::observability::messages::{
    trampoline::{InvocationCompleted, InvocationStarted},
    StructuredLog,
};
use crate::protocol::{FunctionCall, FunctionReturn};
use crate::traits::{CpuUsageHook, ExecutionHooks, QueueAdapter, Wrapper};

const FLAVOR: &str = "https";

/// Runs a call delivered directly and returns its outcome inline.
///
/// No heartbeat and no `response` message: the caller is waiting on the
/// request itself. CPU samples still go to the reply channel when the call
/// names one.
pub struct HttpsTrampoline {
    queue: Arc<dyn QueueAdapter>,
    wrapper: Arc<dyn Wrapper>,
    child_timeout: Option<Duration>,
}

impl HttpsTrampoline {
    pub fn new(queue: Arc<dyn QueueAdapter>, wrapper: Arc<dyn Wrapper>, cfg: &TrampolineConfig) -> Self {
        Self {
            queue,
            wrapper,
            child_timeout: cfg.child_timeout(),
        }
    }

    pub async fn handle(&self, call: FunctionCall, host: &HostContext) -> FunctionReturn {
        let started = Instant::now();
        let timeout = host.effective_timeout(self.child_timeout, Utc::now());
        let side_tasks = TaskTracker::new();

        let cpu_usage: Arc<dyn CpuUsageHook> = match call.reply_channel() {
            Some(channel) => Arc::new(MetricsPublisher {
                queue: Arc::clone(&self.queue),
                channel: channel.to_string(),
                call_id: call.call_id.clone(),
                tasks: side_tasks.clone(),
            }),
            None => Arc::new(DiscardMetrics),
        };

        let context = host.calling_context(call);
        let start_msg = InvocationStarted {
            flavor: FLAVOR,
            call_id: context.call_id(),
            function: &context.call.name,
            timeout,
        };
        let span = start_msg.span("invocation");
        span.in_scope(|| start_msg.log());

        let hooks = ExecutionHooks {
            cpu_usage,
            override_timeout: timeout,
        };
        let execution = async {
            let outcome = match self.wrapper.execute(context.clone(), hooks).await {
                Ok(value) => context.returned(value),
                Err(failure) => context.error_return(shape_error(&failure)),
            };

            side_tasks.close();
            side_tasks.wait().await;

            InvocationCompleted {
                call_id: context.call_id(),
                outcome: if outcome.is_error() { "failed" } else { "completed" },
                duration: started.elapsed(),
            }
            .log();

            outcome
        };
        execution.instrument(span).await
    }
}
