// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Functions that misbehave on purpose: raise, stall or die.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::u64_arg;
use crate::errors::ExecutionFailure;
use crate::traits::RemoteFunction;

/// Always raises an error mentioning its argument.
pub struct FailFunction;

#[async_trait]
impl RemoteFunction for FailFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let argument = match args.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Err(ExecutionFailure::raised(
            "Error",
            format!("Expected this error. Argument: {}", argument),
        ))
    }

    fn name(&self) -> &'static str {
        "fail"
    }
}

/// Sleeps for the given number of milliseconds, then returns it.
pub struct SleepFunction;

#[async_trait]
impl RemoteFunction for SleepFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let ms = u64_arg(self.name(), &args, 0)?;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(Value::from(ms))
    }

    fn name(&self) -> &'static str {
        "sleep"
    }
}

/// Simulates the process being killed by a signal (`SIGKILL` unless given).
pub struct CrashFunction;

#[async_trait]
impl RemoteFunction for CrashFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let signal = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or("SIGKILL")
            .to_string();
        Err(ExecutionFailure::Terminated { signal })
    }

    fn name(&self) -> &'static str {
        "crash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fail_mentions_argument() {
        let err = FailFunction.call(vec![json!("hey")]).await.unwrap_err();
        assert_eq!(err.to_string(), "Expected this error. Argument: hey");
        assert_eq!(err.name(), "Error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_returns_duration() {
        assert_eq!(SleepFunction.call(vec![json!(2500)]).await.unwrap(), json!(2500));
    }

    #[tokio::test]
    async fn test_crash_defaults_to_kill() {
        let err = CrashFunction.call(vec![]).await.unwrap_err();
        assert_eq!(
            err,
            ExecutionFailure::Terminated {
                signal: "SIGKILL".to_string()
            }
        );
    }
}
