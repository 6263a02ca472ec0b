// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Google Pub/Sub queue adapter over the v1 REST API.
//!
//! Replies are published to a topic and pulled from a subscription. Message
//! data travels base64-encoded; `kind` and `callId` travel as attributes.

pub mod api;
pub mod client;
pub mod queue;

pub use api::{
    AcknowledgeRequest, ApiResponse, HttpSize, PubSubApi, PublishRequest, PublishResponse,
    PubsubMessage, PullRequest, PullResponse, ReceivedMessage,
};
pub use client::HttpPubSubClient;
pub use queue::PubSubQueue;
