use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExecutionFailure;
use crate::protocol::{CallingContext, CpuMetrics};

/// Receives CPU usage samples while a call runs.
#[async_trait]
pub trait CpuUsageHook: Send + Sync {
    async fn on_cpu_usage(&self, metrics: CpuMetrics);
}

/// Callbacks and limits handed to a wrapper for one execution.
#[derive(Clone)]
pub struct ExecutionHooks {
    pub cpu_usage: Arc<dyn CpuUsageHook>,
    /// Time budget left for this execution, when known.
    pub override_timeout: Option<Duration>,
}

/// The local sandbox that actually runs user code.
#[async_trait]
pub trait Wrapper: Send + Sync {
    /// Run the call described by `context`.
    ///
    /// `hooks.cpu_usage` may be invoked zero or more times before this
    /// returns. A failed user function is reported as `Err`.
    async fn execute(
        &self,
        context: CallingContext,
        hooks: ExecutionHooks,
    ) -> Result<Value, ExecutionFailure>;
}
