// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors produced while turning transport payloads into protocol values.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Message is missing the '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("Unknown message kind: '{0}'")]
    UnknownKind(String),

    #[error("'{kind}' message for call '{call_id}' has an empty body")]
    EmptyBody { kind: &'static str, call_id: String },

    #[error("Response body belongs to call '{body}' but is tagged with call '{attribute}'")]
    CorrelationMismatch { attribute: String, body: String },

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Call '{call_id}' has no reply channel")]
    MissingReplyChannel { call_id: String },

    #[error("Unrecognized host event: {0}")]
    UnrecognizedEvent(String),
}
