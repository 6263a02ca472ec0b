// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use super::LocalFunctionFactory;
use crate::errors::ExecutionFailure;
use crate::traits::RemoteFunction;

/// Registry mapping function names to their implementations.
///
/// The local wrapper resolves `FunctionCall::name` against this map. Entries
/// are `Arc<dyn RemoteFunction>` so concurrent invocations share one instance.
///
/// # Example
/// ```
/// use cloudcall::backends::local::FunctionMap;
///
/// let functions = FunctionMap::builtins();
/// assert!(functions.contains_key("identity"));
/// assert!(functions.get("nonexistent").is_none());
/// ```
#[derive(Clone, Default)]
pub struct FunctionMap(pub HashMap<String, Arc<dyn RemoteFunction>>);

impl FunctionMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Every builtin the local factory knows about.
    pub fn builtins() -> Self {
        Self::from_names(&LocalFunctionFactory::list_available_implementations())
            .unwrap_or_default()
    }

    /// Build a map from builtin names, failing on the first unknown one.
    pub fn from_names(names: &[&str]) -> Result<Self, ExecutionFailure> {
        let mut registry = HashMap::new();
        for name in names {
            let function = LocalFunctionFactory::create_function(name)?;
            registry.insert(name.to_string(), function);
        }
        Ok(Self(registry))
    }

    pub fn insert(&mut self, name: String, function: Arc<dyn RemoteFunction>) {
        self.0.insert(name, function);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RemoteFunction>> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for FunctionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionMap")
            .field("function_count", &self.0.len())
            .field("function_names", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<HashMap<String, Arc<dyn RemoteFunction>>> for FunctionMap {
    fn from(map: HashMap<String, Arc<dyn RemoteFunction>>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let map = FunctionMap::builtins();
        assert_eq!(map.len(), LocalFunctionFactory::list_available_implementations().len());
        for name in ["identity", "hello", "concat", "fact", "fail", "sleep", "crash"] {
            assert!(map.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_from_names_rejects_unknown() {
        let err = FunctionMap::from_names(&["identity", "bogus"]).unwrap_err();
        assert_eq!(err, ExecutionFailure::FunctionNotFound("bogus".to_string()));
    }

    #[test]
    fn test_debug_lists_names() {
        let map = FunctionMap::from_names(&["hello"]).unwrap();
        let debug = format!("{:?}", map);
        assert!(debug.contains("function_count: 1"));
        assert!(debug.contains("hello"));
    }
}
