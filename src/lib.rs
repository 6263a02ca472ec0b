// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // queue providers + local wrapper
pub mod config;     // trampoline configuration
pub mod errors;     // error handling + error shaping
pub mod observability;
pub mod protocol;   // calls, messages, wire attributes
pub mod queue;      // provider-neutral adapter plumbing
pub mod trampoline; // remote-side invocation state machine
pub mod traits;     // unified abstractions
