// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod faults;
pub mod math;
pub mod text;

pub use faults::*;
pub use math::*;
pub use text::*;

use serde_json::Value;

use crate::errors::ExecutionFailure;

fn string_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, ExecutionFailure> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ExecutionFailure::InvalidArguments {
            function: function.to_string(),
            reason: format!("argument {} must be a string", index),
        })
}

fn u64_arg(function: &str, args: &[Value], index: usize) -> Result<u64, ExecutionFailure> {
    args.get(index)
        .and_then(Value::as_u64)
        .ok_or_else(|| ExecutionFailure::InvalidArguments {
            function: function.to_string(),
            reason: format!("argument {} must be a non-negative integer", index),
        })
}
