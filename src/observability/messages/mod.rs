// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting it with structured fields at the level
//! documented on the type.
//!
//! * `trampoline` - invocation lifecycle events on the remote side
//! * `queue` - queue adapter transport events
//!
//! # Usage Pattern
//!
//! ```rust
//! use cloudcall::observability::messages::{queue::ReceiveCancelled, StructuredLog};
//!
//! let msg = ReceiveCancelled {
//!     provider: "local",
//!     channel: "replies",
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod queue;
pub mod trampoline;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit this message as a tracing event.
    fn log(&self);

    /// Open a span carrying this message's fields.
    fn span(&self, name: &str) -> Span;
}
