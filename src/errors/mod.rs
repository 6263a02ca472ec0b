// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod decode;
mod execution;
pub mod shaping;
mod transport;

pub use config::ConfigError;
pub use decode::DecodeError;
pub use execution::ExecutionFailure;
pub use shaping::{shape_error, ShapedError};
pub use transport::TransportError;
