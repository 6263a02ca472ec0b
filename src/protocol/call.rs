// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ShapedError;

/// Encoded request to run one function remotely.
///
/// `call_id` is the sole correlation key for every message describing this
/// invocation. `response_queue_id` is absent only for direct-return calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub call_id: String,
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_queue_id: Option<String>,
}

impl FunctionCall {
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            args,
            module_path: None,
            response_queue_id: None,
        }
    }

    pub fn with_reply_channel(mut self, channel: impl Into<String>) -> Self {
        self.response_queue_id = Some(channel.into());
        self
    }

    pub fn reply_channel(&self) -> Option<&str> {
        self.response_queue_id.as_deref()
    }
}

/// Resource usage sample reported while a call is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utime_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stime_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
}

/// Everything a wrapper needs to know about the invocation it is running.
#[derive(Debug, Clone)]
pub struct CallingContext {
    pub call: FunctionCall,
    pub start_time: DateTime<Utc>,
    pub execution_id: String,
    pub log_url: Option<String>,
    pub instance_id: Option<String>,
}

impl CallingContext {
    pub fn call_id(&self) -> &str {
        &self.call.call_id
    }

    /// Successful return stamped with this context.
    pub fn returned(&self, value: Value) -> FunctionReturn {
        self.finish(ReturnOutcome::Returned { value })
    }

    /// Error return stamped with this context.
    pub fn error_return(&self, error: ShapedError) -> FunctionReturn {
        self.finish(ReturnOutcome::Error { error })
    }

    fn finish(&self, outcome: ReturnOutcome) -> FunctionReturn {
        FunctionReturn {
            call_id: self.call.call_id.clone(),
            outcome,
            execution_id: self.execution_id.clone(),
            log_url: self.log_url.clone(),
            instance_id: self.instance_id.clone(),
            start_time: self.start_time,
            end_time: Utc::now(),
        }
    }
}

/// Outcome of a function call, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReturnOutcome {
    Returned { value: Value },
    Error { error: ShapedError },
}

/// Body of a `response` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReturn {
    pub call_id: String,
    #[serde(flatten)]
    pub outcome: ReturnOutcome,
    pub execution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl FunctionReturn {
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            ReturnOutcome::Returned { value } => Some(value),
            ReturnOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ShapedError> {
        match &self.outcome {
            ReturnOutcome::Returned { .. } => None,
            ReturnOutcome::Error { error } => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> CallingContext {
        CallingContext {
            call: FunctionCall::new("42", "identity", vec![json!("abc123")]).with_reply_channel("replies"),
            start_time: Utc::now(),
            execution_id: "exec-1".to_string(),
            log_url: None,
            instance_id: Some("instance-a".to_string()),
        }
    }

    #[test]
    fn test_call_wire_names() {
        let call = FunctionCall::new("42", "identity", vec![json!("abc123")]).with_reply_channel("replies");
        let json = serde_json::to_value(&call).unwrap();

        assert_eq!(json["callId"], "42");
        assert_eq!(json["responseQueueId"], "replies");
        assert!(json.get("modulePath").is_none());
    }

    #[test]
    fn test_call_without_args_decodes() {
        let call: FunctionCall = serde_json::from_str(r#"{"callId":"7","name":"noargs"}"#).unwrap();
        assert!(call.args.is_empty());
        assert_eq!(call.reply_channel(), None);
    }

    #[test]
    fn test_returned_carries_context() {
        let ret = context().returned(json!("abc123"));

        assert_eq!(ret.call_id, "42");
        assert_eq!(ret.execution_id, "exec-1");
        assert_eq!(ret.value(), Some(&json!("abc123")));
        assert!(ret.end_time >= ret.start_time);
    }

    #[test]
    fn test_error_return_wire_shape() {
        let ret = context().error_return(ShapedError::new("Error", "boom"));
        let json = serde_json::to_value(&ret).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["error"]["message"], "boom");
        assert_eq!(json["callId"], "42");

        let decoded: FunctionReturn = serde_json::from_value(json).unwrap();
        assert!(decoded.is_error());
    }
}
