// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by queue adapters while talking to a provider.

use thiserror::Error;

/// Failure of a single provider call made by a queue adapter.
///
/// Adapters classify each failure with [`TransportError::is_retryable`]; only
/// transient failures are retried by the bounded publish loop.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection reset, DNS failure, request aborted mid-flight.
    #[error("Network error during {operation}: {reason}")]
    Network { operation: String, reason: String },

    /// The provider asked us to slow down.
    #[error("Provider throttled {operation}")]
    Throttled { operation: String },

    /// Non-success HTTP status from a provider REST endpoint.
    #[error("Provider returned HTTP {status} during {operation}: {reason}")]
    Http {
        operation: String,
        status: u16,
        reason: String,
    },

    /// The queue, topic or subscription does not exist.
    #[error("Channel not found: {channel}")]
    ChannelNotFound { channel: String },

    /// The provider call did not finish in time.
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// The provider answered with a body we could not understand.
    #[error("Invalid provider response during {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },

    /// The outgoing message could not be serialized.
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The adapter was disposed by its owner.
    #[error("Queue adapter has been disposed")]
    Disposed,
}

impl TransportError {
    /// Whether retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Throttled { .. } => true,
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,

            Self::ChannelNotFound { .. } => false,
            Self::InvalidResponse { .. } => false,
            Self::Encode(_) => false,
            Self::Disposed => false,
        }
    }

    pub fn network(operation: &str, reason: impl ToString) -> Self {
        Self::Network {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(TransportError::network("publish", "connection reset").is_retryable());
        assert!(TransportError::Throttled { operation: "publish".into() }.is_retryable());
        assert!(TransportError::Timeout { operation: "pull".into() }.is_retryable());
        assert!(TransportError::Http {
            operation: "publish".into(),
            status: 503,
            reason: "unavailable".into(),
        }
        .is_retryable());
        assert!(TransportError::Http {
            operation: "publish".into(),
            status: 429,
            reason: "too many requests".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_permanent_errors_are_not_retryable() {
        assert!(!TransportError::ChannelNotFound { channel: "nope".into() }.is_retryable());
        assert!(!TransportError::Disposed.is_retryable());
        assert!(!TransportError::Http {
            operation: "publish".into(),
            status: 403,
            reason: "forbidden".into(),
        }
        .is_retryable());
    }
}
