// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging in cloudcall. Message types follow a struct-based pattern with a `Display`
//! implementation plus [`StructuredLog`](messages::StructuredLog), so that:
//!
//! * There are no magic strings scattered through the trampoline and adapters
//! * Every event carries the same structured fields (`call_id`, `channel`, ...)
//! * Log levels are decided once, next to the message they belong to
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::trampoline` - invocation lifecycle, heartbeat and response publishing
//! * `messages::queue` - adapter publish retries, receive batches, dropped messages
//!
//! # Usage
//!
//! ```rust
//! use cloudcall::observability::messages::{trampoline::HeartbeatPublished, StructuredLog};
//!
//! HeartbeatPublished { call_id: "42", channel: "replies" }.log();
//! ```

pub mod messages;
