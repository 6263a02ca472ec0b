// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::string_arg;
use crate::errors::ExecutionFailure;
use crate::traits::RemoteFunction;

/// Returns its first argument unchanged (`null` when called without one).
pub struct IdentityFunction;

#[async_trait]
impl RemoteFunction for IdentityFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        Ok(args.into_iter().next().unwrap_or(Value::Null))
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Greets its argument: `hello("Andy")` -> `"Hello Andy!"`.
pub struct HelloFunction;

#[async_trait]
impl RemoteFunction for HelloFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let name = string_arg(self.name(), &args, 0)?;
        Ok(Value::String(format!("Hello {}!", name)))
    }

    fn name(&self) -> &'static str {
        "hello"
    }
}

/// Concatenates two strings.
pub struct ConcatFunction;

#[async_trait]
impl RemoteFunction for ConcatFunction {
    async fn call(&self, args: Vec<Value>) -> Result<Value, ExecutionFailure> {
        let left = string_arg(self.name(), &args, 0)?;
        let right = string_arg(self.name(), &args, 1)?;
        Ok(Value::String(format!("{}{}", left, right)))
    }

    fn name(&self) -> &'static str {
        "concat"
    }
}
