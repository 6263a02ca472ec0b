// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Queue-based remote invocation protocol.
//!
//! A caller sends a [`FunctionCall`] to the remote side; the remote side
//! answers with one-way [`Message`]s published to the call's reply channel.
//! Every message except a dead letter is tagged with two string attributes,
//! [`KIND_ATTR`] and [`CALLID_ATTR`], so receivers can route and filter
//! without touching the body:
//!
//! ```text
//! kind             callId   body
//! functionstarted  yes      empty
//! response         yes      serialized FunctionReturn
//! cpumetrics       yes      serialized CpuMetrics
//! deadletter       no       raw transport payload (observed only)
//! ```
//!
//! Delivery is at-least-once. [`ResponseLedger`] gives consumers an
//! idempotent view of terminal responses.

mod call;
pub mod codec;
mod ledger;
mod message;

use std::collections::HashMap;

pub use call::{CallingContext, CpuMetrics, FunctionCall, FunctionReturn, ReturnOutcome};
pub use ledger::{Disposition, ResponseLedger};
pub use message::{Envelope, Message, MessageKind, PollResult, ReceivableMessage};

/// Attribute carrying the message kind.
pub const KIND_ATTR: &str = "kind";

/// Attribute carrying the correlation id of the originating call.
pub const CALLID_ATTR: &str = "callId";

/// String-valued transport attributes attached to a message.
pub type Attributes = HashMap<String, String>;
