use std::sync::Arc;

use super::functions::*;
use crate::errors::ExecutionFailure;
use crate::traits::RemoteFunction;

/// Factory for the in-process builtin functions.
pub struct LocalFunctionFactory;

impl LocalFunctionFactory {
    /// Create a function instance by name
    ///
    /// - "identity" -> IdentityFunction
    /// - "hello" -> HelloFunction
    /// - "concat" -> ConcatFunction
    /// - "fact" -> FactorialFunction
    /// - "fail" -> FailFunction (always raises)
    /// - "sleep" -> SleepFunction
    /// - "crash" -> CrashFunction (simulated signal termination)
    pub fn create_function(name: &str) -> Result<Arc<dyn RemoteFunction>, ExecutionFailure> {
        match name {
            "identity" => Ok(Arc::new(IdentityFunction)),
            "hello" => Ok(Arc::new(HelloFunction)),
            "concat" => Ok(Arc::new(ConcatFunction)),
            "fact" => Ok(Arc::new(FactorialFunction)),
            "fail" => Ok(Arc::new(FailFunction)),
            "sleep" => Ok(Arc::new(SleepFunction)),
            "crash" => Ok(Arc::new(CrashFunction)),
            _ => Err(ExecutionFailure::FunctionNotFound(name.to_string())),
        }
    }

    /// List all builtin function names
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec!["identity", "hello", "concat", "fact", "fail", "sleep", "crash"]
    }

    pub fn is_implementation_available(name: &str) -> bool {
        Self::list_available_implementations().contains(&name)
    }
}
