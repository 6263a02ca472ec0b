// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Provider-neutral plumbing shared by every queue adapter.
//!
//! * [`retry_op`] - bounded retry for transient transport errors
//! * [`TransportMetrics`] - byte counters shared with the adapter's owner
//! * [`decode_batch`] - per-message decoding that never fails the batch
//! * [`envelope_size`] - wire size used for byte accounting

mod metrics;
mod retry;

use crate::observability::messages::{
    queue::{BatchReceived, DeadLetterObserved, MessageDropped},
    StructuredLog,
};
use crate::errors::DecodeError;
use crate::protocol::{Envelope, PollResult, ReceivableMessage};

pub use metrics::{MetricsSnapshot, TransportMetrics};
pub use retry::retry_op;

/// Bytes an envelope occupies on the wire: body plus attribute keys and values.
pub fn envelope_size(envelope: &Envelope) -> u64 {
    let attributes: usize = envelope
        .attributes
        .iter()
        .map(|(key, value)| key.len() + value.len())
        .sum();
    (envelope.body.len() + attributes) as u64
}

/// Decode a fetched batch, dropping messages that fail to decode.
///
/// Each item is the adapter's conversion of one provider message; a failed
/// conversion is dropped like any other undecodable message. `max_batch_size`
/// is the limit the fetch was made with; a batch of exactly that size is
/// reported as full.
pub fn decode_batch(
    provider: &str,
    channel: &str,
    fetched: Vec<Result<Envelope, DecodeError>>,
    max_batch_size: usize,
) -> PollResult {
    let total = fetched.len();
    let mut messages = Vec::with_capacity(total);

    for item in fetched {
        let decoded = item.and_then(|envelope| {
            ReceivableMessage::decode(&envelope).map(|message| (envelope.body.len(), message))
        });
        match decoded {
            Ok((size, message @ ReceivableMessage::DeadLetter { .. })) => {
                DeadLetterObserved {
                    provider,
                    channel,
                    size,
                }
                .log();
                messages.push(message);
            }
            Ok((_, message)) => messages.push(message),
            Err(error) => MessageDropped {
                provider,
                channel,
                error: &error,
            }
            .log(),
        }
    }

    let result = PollResult {
        messages,
        is_full_batch: total == max_batch_size,
    };

    BatchReceived {
        provider,
        channel,
        fetched: total,
        delivered: result.messages.len(),
        is_full_batch: result.is_full_batch,
    }
    .log();

    result
}
