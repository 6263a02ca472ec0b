// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use super::FunctionMap;
use crate::config::TrampolineConfig;
use crate::errors::ExecutionFailure;
use crate::protocol::{CallingContext, CpuMetrics};
use crate::traits::{CpuUsageHook, ExecutionHooks, Wrapper};

/// Runs calls in-process against a [`FunctionMap`].
///
/// The override timeout from the hooks bounds the whole execution. When a
/// sample interval is set, elapsed-time samples are handed to the CPU usage
/// hook while the function runs.
#[derive(Debug, Clone)]
pub struct LocalWrapper {
    functions: FunctionMap,
    cpu_sample_interval: Option<Duration>,
}

impl LocalWrapper {
    pub fn new(functions: FunctionMap) -> Self {
        Self {
            functions,
            cpu_sample_interval: None,
        }
    }

    pub fn with_builtins() -> Self {
        Self::new(FunctionMap::builtins())
    }

    /// A zero interval turns sampling off.
    pub fn with_cpu_sample_interval(mut self, interval: Duration) -> Self {
        self.cpu_sample_interval = Some(interval);
        self
    }

    pub fn from_config(cfg: &TrampolineConfig) -> Self {
        Self {
            functions: FunctionMap::builtins(),
            cpu_sample_interval: cfg.cpu_sample_interval(),
        }
    }

    async fn run_sampled<F>(
        &self,
        call: F,
        hook: Arc<dyn CpuUsageHook>,
    ) -> Result<Value, ExecutionFailure>
    where
        F: Future<Output = Result<Value, ExecutionFailure>>,
    {
        let Some(interval) = self.cpu_sample_interval.filter(|interval| !interval.is_zero()) else {
            return call.await;
        };

        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + interval, interval);
        tokio::pin!(call);

        loop {
            tokio::select! {
                result = &mut call => return result,
                _ = ticker.tick() => {
                    let metrics = CpuMetrics {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        ..Default::default()
                    };
                    hook.on_cpu_usage(metrics).await;
                }
            }
        }
    }
}

#[async_trait]
impl Wrapper for LocalWrapper {
    async fn execute(
        &self,
        context: CallingContext,
        hooks: ExecutionHooks,
    ) -> Result<Value, ExecutionFailure> {
        let name = context.call.name.as_str();
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionFailure::FunctionNotFound(name.to_string()))?;

        tracing::debug!(
            call_id = context.call_id(),
            function = name,
            args = context.call.args.len(),
            "Executing local function"
        );

        let call = function.call(context.call.args.clone());
        let sampled = self.run_sampled(call, hooks.cpu_usage.clone());

        match hooks.override_timeout {
            Some(limit) => tokio::time::timeout(limit, sampled)
                .await
                .map_err(|_| ExecutionFailure::Timeout(limit))?,
            None => sampled.await,
        }
    }
}
