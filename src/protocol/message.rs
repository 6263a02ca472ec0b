// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{codec, Attributes, CpuMetrics, FunctionReturn, CALLID_ATTR, KIND_ATTR};
use crate::errors::DecodeError;

/// Wire value of the `kind` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    FunctionStarted,
    Response,
    CpuMetrics,
    DeadLetter,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::FunctionStarted => "functionstarted",
            MessageKind::Response => "response",
            MessageKind::CpuMetrics => "cpumetrics",
            MessageKind::DeadLetter => "deadletter",
        }
    }

    /// Only `response` ends an invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageKind::Response)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "functionstarted" => Ok(MessageKind::FunctionStarted),
            "response" => Ok(MessageKind::Response),
            "cpumetrics" => Ok(MessageKind::CpuMetrics),
            "deadletter" => Ok(MessageKind::DeadLetter),
            other => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }
}

/// Provider-neutral transport message: attributes plus an opaque body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub attributes: Attributes,
    pub body: Vec<u8>,
    /// Provider publish time, when the provider reports one.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Envelope {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A message the remote side publishes about a call.
///
/// Dead letters are deliberately absent: they are never produced by the
/// protocol, only observed by receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    FunctionStarted { call_id: String },
    Response { call_id: String, body: FunctionReturn },
    CpuMetrics { call_id: String, metrics: CpuMetrics },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::FunctionStarted { .. } => MessageKind::FunctionStarted,
            Message::Response { .. } => MessageKind::Response,
            Message::CpuMetrics { .. } => MessageKind::CpuMetrics,
        }
    }

    pub fn call_id(&self) -> &str {
        match self {
            Message::FunctionStarted { call_id }
            | Message::Response { call_id, .. }
            | Message::CpuMetrics { call_id, .. } => call_id,
        }
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::from([
            (KIND_ATTR.to_string(), self.kind().as_str().to_string()),
            (CALLID_ATTR.to_string(), self.call_id().to_string()),
        ])
    }

    /// Encode into attributes plus serialized body.
    pub fn encode(&self) -> Result<Envelope, serde_json::Error> {
        let body = match self {
            Message::FunctionStarted { .. } => Vec::new(),
            Message::Response { body, .. } => codec::serialize(body)?,
            Message::CpuMetrics { metrics, .. } => codec::serialize(metrics)?,
        };
        Ok(Envelope {
            attributes: self.attributes(),
            body,
            timestamp: None,
        })
    }
}

/// A message as seen by a receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceivableMessage {
    FunctionStarted {
        call_id: String,
    },
    Response {
        call_id: String,
        body: FunctionReturn,
        timestamp: Option<DateTime<Utc>>,
    },
    CpuMetrics {
        call_id: String,
        metrics: CpuMetrics,
    },
    DeadLetter {
        attributes: Attributes,
        raw: Vec<u8>,
    },
}

impl ReceivableMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ReceivableMessage::FunctionStarted { .. } => MessageKind::FunctionStarted,
            ReceivableMessage::Response { .. } => MessageKind::Response,
            ReceivableMessage::CpuMetrics { .. } => MessageKind::CpuMetrics,
            ReceivableMessage::DeadLetter { .. } => MessageKind::DeadLetter,
        }
    }

    pub fn call_id(&self) -> Option<&str> {
        match self {
            ReceivableMessage::FunctionStarted { call_id }
            | ReceivableMessage::Response { call_id, .. }
            | ReceivableMessage::CpuMetrics { call_id, .. } => Some(call_id),
            ReceivableMessage::DeadLetter { .. } => None,
        }
    }

    /// Decode one transport message.
    ///
    /// Fails when `kind` is missing or unknown, when `callId` is missing on a
    /// non-dead-letter message, or when a body is empty or undecodable.
    pub fn decode(envelope: &Envelope) -> Result<Self, DecodeError> {
        let kind: MessageKind = envelope
            .attribute(KIND_ATTR)
            .ok_or(DecodeError::MissingAttribute(KIND_ATTR))?
            .parse()?;

        let call_id = || {
            envelope
                .attribute(CALLID_ATTR)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .ok_or(DecodeError::MissingAttribute(CALLID_ATTR))
        };

        match kind {
            MessageKind::DeadLetter => Ok(ReceivableMessage::DeadLetter {
                attributes: envelope.attributes.clone(),
                raw: envelope.body.clone(),
            }),
            MessageKind::FunctionStarted => Ok(ReceivableMessage::FunctionStarted { call_id: call_id()? }),
            MessageKind::Response => {
                let call_id = call_id()?;
                if envelope.body.is_empty() {
                    return Err(DecodeError::EmptyBody {
                        kind: kind.as_str(),
                        call_id,
                    });
                }
                let body: FunctionReturn = codec::deserialize(&envelope.body)?;
                if body.call_id != call_id {
                    return Err(DecodeError::CorrelationMismatch {
                        attribute: call_id,
                        body: body.call_id,
                    });
                }
                Ok(ReceivableMessage::Response {
                    call_id,
                    body,
                    timestamp: envelope.timestamp,
                })
            }
            MessageKind::CpuMetrics => {
                let call_id = call_id()?;
                if envelope.body.is_empty() {
                    return Err(DecodeError::EmptyBody {
                        kind: kind.as_str(),
                        call_id,
                    });
                }
                let metrics = codec::deserialize(&envelope.body)?;
                Ok(ReceivableMessage::CpuMetrics { call_id, metrics })
            }
        }
    }
}

/// Result of one `receive` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollResult {
    pub messages: Vec<ReceivableMessage>,
    /// The provider returned a full batch; more work is likely pending.
    pub is_full_batch: bool,
}

impl PollResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
