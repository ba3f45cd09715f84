// src/config.rs
//
// Analyzer settings and the host functions `[External]` declarations bind to.

use crate::type_arena::{BuiltinKind, TypeArena, TypeId};

/// Environment variable overriding `max_unroll_iterations`.
pub const MAX_UNROLL_ENV: &str = "BRIM_MAX_UNROLL";

/// Parameter or return type of a host function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostType {
    Builtin(BuiltinKind),
    Pointer(Box<HostType>),
}

impl HostType {
    pub fn pointer_to(inner: HostType) -> Self {
        HostType::Pointer(Box::new(inner))
    }

    pub fn to_type_id(&self, arena: &mut TypeArena) -> TypeId {
        match self {
            HostType::Builtin(kind) => kind.type_id(),
            HostType::Pointer(inner) => {
                let inner = inner.to_type_id(arena);
                arena.pointer(inner)
            }
        }
    }
}

/// A function provided by the runtime, callable through `[External("name")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFunction {
    pub name: String,
    pub params: Vec<HostType>,
    pub ret: HostType,
}

impl HostFunction {
    pub fn new(name: &str, params: Vec<HostType>, ret: HostType) -> Self {
        Self {
            name: name.to_string(),
            params,
            ret,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SemaConfig {
    /// Iterations a single loop may unroll to before it is an error
    pub max_unroll_iterations: usize,
    /// Record unrolled bodies for every unrollable `for`
    pub unroll_loops: bool,
    pub eliminate_unused: bool,
    /// Upper bound on elimination rounds
    pub max_elimination_passes: usize,
    /// Report `MissingEntryPoint` when no `[CodeEntry]` function exists
    pub require_entry_point: bool,
    pub host_functions: Vec<HostFunction>,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            max_unroll_iterations: 4096,
            unroll_loops: false,
            eliminate_unused: true,
            max_elimination_passes: 32,
            require_entry_point: false,
            host_functions: Vec::new(),
        }
    }
}

impl SemaConfig {
    /// Defaults with `BRIM_MAX_UNROLL` applied when it holds a number.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_UNROLL_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) => config.max_unroll_iterations = limit,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {}", MAX_UNROLL_ENV),
            }
        }
        config
    }

    pub fn host_function(&self, name: &str) -> Option<&HostFunction> {
        self.host_functions.iter().find(|h| h.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SemaConfig::default();
        assert_eq!(config.max_unroll_iterations, 4096);
        assert!(!config.unroll_loops);
        assert!(config.eliminate_unused);
        assert!(!config.require_entry_point);
    }

    #[test]
    fn host_pointer_types_intern() {
        let mut arena = TypeArena::new();
        let ty = HostType::pointer_to(HostType::Builtin(BuiltinKind::Char)).to_type_id(&mut arena);
        assert_eq!(arena.unwrap_pointer(ty), Some(TypeId::CHAR));
    }
}
