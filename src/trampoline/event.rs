// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::Value;

use super::batch::{BatchTrampoline, NotificationBatch};
use super::https::HttpsTrampoline;
use super::lifecycle::InvocationReport;
use super::push::{PushMessage, PushTrampoline};
use super::HostContext;
use crate::config::TrampolineConfig;
use crate::errors::DecodeError;
use crate::protocol::{FunctionCall, FunctionReturn};
use crate::traits::{QueueAdapter, Wrapper};

/// A raw host event, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A call object delivered directly (has `callId`).
    Direct(FunctionCall),
    /// A notification batch (has `Records`).
    Batch(NotificationBatch),
    /// A subscription push (has `data`).
    Push(PushMessage),
}

impl HostEvent {
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let Some(object) = value.as_object() else {
            return Err(DecodeError::UnrecognizedEvent(format!(
                "expected a JSON object, got {}",
                json_type(&value)
            )));
        };

        if object.contains_key("callId") {
            Ok(HostEvent::Direct(serde_json::from_value(value)?))
        } else if object.contains_key("Records") {
            Ok(HostEvent::Batch(serde_json::from_value(value)?))
        } else if object.contains_key("data") {
            Ok(HostEvent::Push(serde_json::from_value(value)?))
        } else {
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            Err(DecodeError::UnrecognizedEvent(format!(
                "no callId, Records or data field (keys: [{}])",
                keys.join(", ")
            )))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What a routed host event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOutcome {
    /// Direct call: the return value for the host to hand back.
    Direct(FunctionReturn),
    /// One report per batch record that ran.
    Batch(Vec<InvocationReport>),
    /// The pushed call's report, `None` if it could not be decoded.
    Push(Option<InvocationReport>),
}

/// Single entry point for every trampoline flavor.
pub struct HostEventRouter {
    batch: BatchTrampoline,
    push: PushTrampoline,
    https: HttpsTrampoline,
}

impl HostEventRouter {
    pub fn new(queue: Arc<dyn QueueAdapter>, wrapper: Arc<dyn Wrapper>, cfg: &TrampolineConfig) -> Self {
        Self {
            batch: BatchTrampoline::new(Arc::clone(&queue), Arc::clone(&wrapper), cfg),
            push: PushTrampoline::new(Arc::clone(&queue), Arc::clone(&wrapper), cfg),
            https: HttpsTrampoline::new(queue, wrapper, cfg),
        }
    }

    /// Classify and run a raw host event.
    pub async fn dispatch(&self, raw: &[u8], host: &HostContext) -> Result<HostOutcome, DecodeError> {
        let outcome = match HostEvent::parse(raw)? {
            HostEvent::Direct(call) => HostOutcome::Direct(self.https.handle(call, host).await),
            HostEvent::Batch(batch) => HostOutcome::Batch(self.batch.handle(batch, host).await),
            HostEvent::Push(message) => HostOutcome::Push(self.push.handle(message, host).await),
        };
        Ok(outcome)
    }
}
