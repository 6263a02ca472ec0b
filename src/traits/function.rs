use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExecutionFailure;

/// A named function the local wrapper can run.
#[async_trait]
pub trait RemoteFunction: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure>;

    fn name(&self) -> &'static str;
}
