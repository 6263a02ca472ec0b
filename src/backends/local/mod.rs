// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod function_map;
pub mod functions;
pub mod queue;
pub mod wrapper;

pub use factory::LocalFunctionFactory;
pub use function_map::FunctionMap;
pub use functions::*;
pub use queue::LocalQueue;
pub use wrapper::LocalWrapper;
