// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::u64_arg;
use crate::errors::ExecutionFailure;
use crate::traits::RemoteFunction;

/// Factorial of a non-negative integer; overflowing results are rejected.
pub struct FactorialFunction;

#[async_trait]
impl RemoteFunction for FactorialFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let n = u64_arg(self.name(), &args, 0)?;
        let result = (1..=n)
            .try_fold(1u64, |acc, i| acc.checked_mul(i))
            .ok_or_else(|| ExecutionFailure::InvalidArguments {
                function: self.name().to_string(),
                reason: format!("{}! does not fit in 64 bits", n),
            })?;
        Ok(Value::from(result))
    }

    fn name(&self) -> &'static str {
        "fact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_factorial() {
        assert_eq!(FactorialFunction.call(vec![json!(5)]).await.unwrap(), json!(120));
        assert_eq!(FactorialFunction.call(vec![json!(0)]).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_factorial_overflow() {
        let err = FactorialFunction.call(vec![json!(30)]).await.unwrap_err();
        assert_eq!(err.name(), "InvalidArguments");
    }
}
