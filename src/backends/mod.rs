// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Queue adapters and function wrappers for the remote side of a call.
//!
//! Each backend implements [`QueueAdapter`](crate::traits::QueueAdapter) for one
//! transport. The trampolines only ever see the trait, so switching providers
//! is a construction-time decision.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process queue and builtin functions:
//! - **LocalQueue**: Named in-memory channels with long-poll receive
//! - **LocalWrapper**: Runs builtin functions with timeout and CPU sampling
//! - **Use Case**: Tests, the demo binary, running without a cloud account
//!
//! ## Pub/Sub Backend
//! Google Cloud Pub/Sub over its REST API:
//! - **Publish**: Base64 body plus `kind`/`callId` attributes
//! - **Receive**: Pull, acknowledge, then decode
//! - **Billing**: Provider bytes counted with the 1 KiB minimum
//!
//! ## SQS Backend
//! Amazon SQS through the AWS SDK ([`AwsSqsClient`](sqs::AwsSqsClient)):
//! - **Publish**: String body plus message attributes
//! - **Receive**: Long-poll receive, delete, then decode
//! - **Billing**: Provider bytes counted in 64 KiB chunks
//!
//! # Architecture
//!
//! ```text
//! Trampoline → QueueAdapter → provider API → reply channel
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cloudcall::backends::local::LocalQueue;
//! use cloudcall::queue::TransportMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(TransportMetrics::new());
//! let queue = LocalQueue::new(metrics.clone());
//! # let _ = queue;
//! ```

pub mod local;
pub mod pubsub;
pub mod sqs;
