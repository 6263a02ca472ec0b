// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::lifecycle::{Invocation, InvocationReport};
use super::recovery::{decode_call, report_undecodable};
use super::HostContext;
use crate::config::TrampolineConfig;
use crate::errors::DecodeError;
use crate::observability::messages::{trampoline::CallDecodeFailed, StructuredLog};
use crate::traits::{QueueAdapter, Wrapper};

const FLAVOR: &str = "batch";

/// Notification event carrying one serialized call per record.
///
/// ```json
/// {"Records": [{"Sns": {"Message": "{\"callId\":\"42\", ...}"}}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NotificationBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

/// One entry of `Records`.
///
/// Entries that are not notifications still deserialize, so one bad record
/// does not cost the rest of the batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NotificationRecord {
    Notification {
        #[serde(rename = "Sns")]
        notification: Notification,
    },
    Unrecognized(Value),
}

impl NotificationRecord {
    pub fn notification(message: impl Into<String>) -> Self {
        NotificationRecord::Notification {
            notification: Notification {
                message: message.into(),
                message_id: None,
            },
        }
    }

    /// The serialized call carried by this record.
    pub fn message(&self) -> Result<&str, DecodeError> {
        match self {
            NotificationRecord::Notification { notification } => Ok(&notification.message),
            NotificationRecord::Unrecognized(_) => Err(DecodeError::UnrecognizedEvent(
                "batch record has no Sns.Message string".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
}

/// Runs the calls in a notification batch one after another.
///
/// With `one_shot_batches` (the default) the trampoline stops after the
/// first call that reaches a terminal state; records that fail to decode
/// are skipped and do not count.
pub struct BatchTrampoline {
    queue: Arc<dyn QueueAdapter>,
    wrapper: Arc<dyn Wrapper>,
    child_timeout: Option<Duration>,
    one_shot: bool,
}

impl BatchTrampoline {
    pub fn new(queue: Arc<dyn QueueAdapter>, wrapper: Arc<dyn Wrapper>, cfg: &TrampolineConfig) -> Self {
        Self {
            queue,
            wrapper,
            child_timeout: cfg.child_timeout(),
            one_shot: cfg.one_shot_batches,
        }
    }

    pub async fn handle(&self, batch: NotificationBatch, host: &HostContext) -> Vec<InvocationReport> {
        let mut reports = Vec::new();

        for record in &batch.records {
            let payload = match record.message() {
                Ok(message) => message.as_bytes(),
                Err(error) => {
                    CallDecodeFailed {
                        flavor: FLAVOR,
                        reply_channel: None,
                        error: &error,
                    }
                    .log();
                    continue;
                }
            };
            let Some(call) = decode_call(FLAVOR, payload, &*self.queue, host).await else {
                continue;
            };

            let invocation =
                match Invocation::unpack(Arc::clone(&self.queue), call, host, self.child_timeout) {
                    Ok(invocation) => invocation,
                    Err(error) => {
                        report_undecodable(FLAVOR, payload, &error, &*self.queue, host).await;
                        continue;
                    }
                };

            reports.push(invocation.run(FLAVOR, &*self.wrapper).await);
            if self.one_shot {
                break;
            }
        }

        reports
    }
}
