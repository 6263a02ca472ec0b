// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error shaping: turns raw execution failures into the serializable error
//! body carried by a `response` message.
//!
//! Shaping is a pure function shared by every trampoline flavor. The only
//! reclassification it performs is for out-of-band process termination: a
//! failure whose message carries a kill signal is reported as
//! [`POSSIBLY_OUT_OF_MEMORY`], because the signal alone tells the caller
//! nothing actionable.

use serde::{Deserialize, Serialize};

use super::ExecutionFailure;

/// Signal text that identifies a process killed out-of-band.
pub const TERMINATION_SIGNAL_PATTERN: &str = "SIGKILL";

/// Error name used for failures reclassified as memory exhaustion.
pub const POSSIBLY_OUT_OF_MEMORY: &str = "PossiblyOutOfMemory";

/// Structured, serializable error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedError {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ShapedError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Shape an arbitrary error that did not come from user code, such as a
    /// failed response publish or an undecodable call.
    pub fn from_error(name: &str, error: &dyn std::error::Error) -> Self {
        Self::new(name, error.to_string())
    }

    pub fn is_possibly_out_of_memory(&self) -> bool {
        self.name == POSSIBLY_OUT_OF_MEMORY
    }
}

impl std::fmt::Display for ShapedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Map a raw execution failure to its wire representation.
pub fn shape_error(raw: &ExecutionFailure) -> ShapedError {
    let message = raw.to_string();
    let stack = raw.stack().map(str::to_string);

    if message.contains(TERMINATION_SIGNAL_PATTERN) {
        return ShapedError {
            name: POSSIBLY_OUT_OF_MEMORY.to_string(),
            message: format!("possibly out of memory: {}", message),
            stack,
        };
    }

    ShapedError {
        name: raw.name().to_string(),
        message,
        stack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kill_signal_is_reclassified() {
        let raw = ExecutionFailure::Terminated {
            signal: "SIGKILL".to_string(),
        };
        let shaped = shape_error(&raw);

        assert!(shaped.is_possibly_out_of_memory());
        assert!(shaped.message.contains("SIGKILL"));
    }

    #[test]
    fn test_kill_signal_in_user_error_message_is_reclassified() {
        let raw = ExecutionFailure::raised("Error", "child exited with SIGKILL");
        let shaped = shape_error(&raw);

        assert_eq!(shaped.name, POSSIBLY_OUT_OF_MEMORY);
    }

    #[test]
    fn test_other_errors_pass_through() {
        let raw = ExecutionFailure::Raised {
            name: "TypeError".to_string(),
            message: "Expected this error. Argument: hey".to_string(),
            stack: Some("at fail (functions.rs:12)".to_string()),
        };
        let shaped = shape_error(&raw);

        assert_eq!(shaped.name, "TypeError");
        assert_eq!(shaped.message, "Expected this error. Argument: hey");
        assert_eq!(shaped.stack.as_deref(), Some("at fail (functions.rs:12)"));
    }

    #[test]
    fn test_other_signals_are_not_reclassified() {
        let raw = ExecutionFailure::Terminated {
            signal: "SIGTERM".to_string(),
        };
        let shaped = shape_error(&raw);

        assert_eq!(shaped.name, "ProcessTerminated");
        assert_eq!(shaped.message, "Process terminated by signal SIGTERM");
    }

    #[test]
    fn test_shaping_is_deterministic() {
        let raw = ExecutionFailure::Timeout(Duration::from_secs(3));
        assert_eq!(shape_error(&raw), shape_error(&raw));
        assert_eq!(shape_error(&raw).name, "TimeoutError");
    }

    #[test]
    fn test_stack_is_omitted_when_absent() {
        let shaped = ShapedError::new("Error", "boom");
        let json = serde_json::to_value(&shaped).unwrap();
        assert!(json.get("stack").is_none());
    }
}
