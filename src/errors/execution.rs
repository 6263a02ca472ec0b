// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

/// Raw failure reported by a [`Wrapper`](crate::traits::Wrapper) while running a call.
///
/// This is the input to error shaping; it is never sent over the wire as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    /// The user function raised an error of its own.
    #[error("{message}")]
    Raised {
        name: String,
        message: String,
        stack: Option<String>,
    },

    #[error("Function '{0}' is not registered")]
    FunctionNotFound(String),

    #[error("Invalid arguments for '{function}': {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    /// The process running the function was killed out-of-band.
    #[error("Process terminated by signal {signal}")]
    Terminated { signal: String },

    #[error("Internal wrapper error: {0}")]
    Internal(String),
}

impl ExecutionFailure {
    pub fn raised(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Error name as reported to the caller.
    pub fn name(&self) -> &str {
        match self {
            Self::Raised { name, .. } => name,
            Self::FunctionNotFound(_) => "FunctionNotFound",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::Timeout(_) => "TimeoutError",
            Self::Terminated { .. } => "ProcessTerminated",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Raised { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}
