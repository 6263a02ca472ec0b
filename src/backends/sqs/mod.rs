// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! SQS-style queue adapter.
//!
//! Message bodies are UTF-8 text; `kind` and `callId` travel as `String`
//! message attributes. The network client sits behind [`SqsApi`];
//! [`AwsSqsClient`] implements it over the AWS SDK, and tests use an
//! in-process fake.

pub mod api;
pub mod client;
pub mod queue;

pub use api::{SqsApi, SqsMessage, SqsMessageAttribute, SqsOutgoing};
pub use client::AwsSqsClient;
pub use queue::SqsQueue;
