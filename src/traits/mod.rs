pub mod function;
pub mod queue_adapter;
pub mod wrapper;

pub use function::RemoteFunction;
pub use queue_adapter::QueueAdapter;
pub use wrapper::{CpuUsageHook, ExecutionHooks, Wrapper};
