//! Signatures of the named functions a filter expression may call.
//!
//! The registry is filled once, then only read: parsers look functions up by
//! name to check argument counts and, where a constant makes it decidable,
//! argument kinds. Evaluation is left to the execution layer.

use std::collections::HashMap;
use std::fmt;

pub use common::ValueKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionArity {
    Exact(usize),
    Range { min: usize, max: usize },
    Variadic { min: usize },
}

impl FunctionArity {
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            FunctionArity::Exact(expected) => len == *expected,
            FunctionArity::Range { min, max } => (*min..=*max).contains(&len),
            FunctionArity::Variadic { min } => len >= *min,
        }
    }
}

impl fmt::Display for FunctionArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionArity::Exact(n) => write!(f, "{n}"),
            FunctionArity::Range { min, max } => write!(f, "{min}..{max}"),
            FunctionArity::Variadic { min } => write!(f, "{min}+"),
        }
    }
}

/// The kind of value a parameter expects, or a function returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    Any,
    Boolean,
    Numeric,
    Text,
    Temporal,
    Geometry,
}

impl ArgumentKind {
    /// `null` is admitted everywhere; it only fails at execution time.
    pub fn admits(self, kind: ValueKind) -> bool {
        match (self, kind) {
            (ArgumentKind::Any, _) | (_, ValueKind::Null) => true,
            (ArgumentKind::Boolean, ValueKind::Boolean)
            | (ArgumentKind::Numeric, ValueKind::Numeric)
            | (ArgumentKind::Text, ValueKind::Text)
            | (ArgumentKind::Temporal, ValueKind::Temporal)
            | (ArgumentKind::Geometry, ValueKind::Geometry) => true,
            _ => false,
        }
    }

    /// Two declared kinds are compatible unless both are concrete and differ.
    pub fn compatible(self, other: ArgumentKind) -> bool {
        self == ArgumentKind::Any || other == ArgumentKind::Any || self == other
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentKind::Any => "any",
            ArgumentKind::Boolean => "boolean",
            ArgumentKind::Numeric => "numeric",
            ArgumentKind::Text => "string",
            ArgumentKind::Temporal => "temporal",
            ArgumentKind::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    String,
    Temporal,
    Math,
    Spatial,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub category: FunctionCategory,
    pub arity: FunctionArity,
    pub parameters: Vec<ArgumentKind>,
    pub returns: ArgumentKind,
}

impl FunctionSpec {
    /// A function taking exactly one argument per entry of `parameters`.
    pub fn new(
        name: impl Into<String>,
        category: FunctionCategory,
        parameters: &[ArgumentKind],
        returns: ArgumentKind,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            arity: FunctionArity::Exact(parameters.len()),
            parameters: parameters.to_vec(),
            returns,
        }
    }

    pub fn with_arity(mut self, arity: FunctionArity) -> Self {
        self.arity = arity;
        self
    }

    /// Parameters past the declared list repeat the last declared kind.
    pub fn parameter(&self, position: usize) -> ArgumentKind {
        self.parameters
            .get(position)
            .or_else(|| self.parameters.last())
            .copied()
            .unwrap_or(ArgumentKind::Any)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    AlreadyRegistered(String),
    NotFound(String),
    InvalidArity {
        function: String,
        expected: FunctionArity,
        received: usize,
    },
    InvalidArgument {
        function: String,
        position: usize,
        expected: ArgumentKind,
        found: String,
    },
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::AlreadyRegistered(name) => {
                write!(f, "function '{name}' is already registered")
            }
            FunctionError::NotFound(name) => write!(f, "function '{name}' is not registered"),
            FunctionError::InvalidArity {
                function,
                expected,
                received,
            } => {
                write!(
                    f,
                    "invalid argument count for '{function}': expected {expected}, received {received}"
                )
            }
            FunctionError::InvalidArgument {
                function,
                position,
                expected,
                found,
            } => {
                write!(
                    f,
                    "argument {} of '{function}' must be {expected}, found {found}",
                    position + 1
                )
            }
        }
    }
}

impl std::error::Error for FunctionError {}

#[derive(Default, Clone, Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionSpec>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, spec: FunctionSpec) -> Result<(), FunctionError> {
        let key = spec.name.to_ascii_lowercase();
        if self.functions.contains_key(&key) {
            return Err(FunctionError::AlreadyRegistered(spec.name));
        }
        self.functions.insert(key, spec);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        specs: impl IntoIterator<Item = FunctionSpec>,
    ) -> Result<(), FunctionError> {
        for spec in specs {
            self.register(spec)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks `name` up and checks that it accepts `received` arguments.
    pub fn resolve(&self, name: &str, received: usize) -> Result<&FunctionSpec, FunctionError> {
        let spec = self
            .get(name)
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))?;
        if !spec.arity.accepts(received) {
            return Err(FunctionError::InvalidArity {
                function: spec.name.clone(),
                expected: spec.arity.clone(),
                received,
            });
        }
        Ok(spec)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.values().map(|spec| spec.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substring() -> FunctionSpec {
        FunctionSpec::new(
            "substring",
            FunctionCategory::String,
            &[ArgumentKind::Text, ArgumentKind::Numeric],
            ArgumentKind::Text,
        )
        .with_arity(FunctionArity::Range { min: 2, max: 3 })
    }

    #[test]
    fn registers_and_resolves_function() {
        let mut registry = FunctionRegistry::new();
        registry.register(substring()).expect("register function");

        let spec = registry.resolve("SubString", 3).expect("resolve");
        assert_eq!(spec.name, "substring");
        assert_eq!(spec.parameter(2), ArgumentKind::Numeric);
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut registry = FunctionRegistry::new();
        registry.register(substring()).unwrap();
        let err = registry.register(substring()).unwrap_err();
        assert_eq!(err, FunctionError::AlreadyRegistered("substring".into()));
    }

    #[test]
    fn reports_arity_mismatch() {
        let mut registry = FunctionRegistry::new();
        registry.register(substring()).unwrap();
        match registry.resolve("substring", 1) {
            Err(FunctionError::InvalidArity {
                expected, received, ..
            }) => {
                assert_eq!(expected, FunctionArity::Range { min: 2, max: 3 });
                assert_eq!(received, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            registry.resolve("missing", 0),
            Err(FunctionError::NotFound(_))
        ));
    }

    #[test]
    fn null_is_admitted_by_every_kind() {
        assert!(ArgumentKind::Temporal.admits(ValueKind::Null));
        assert!(!ArgumentKind::Temporal.admits(ValueKind::Numeric));
        assert!(ArgumentKind::Any.admits(ValueKind::Geometry));
    }

    #[test]
    fn declared_kinds_are_compatible_through_any() {
        assert!(ArgumentKind::Text.compatible(ArgumentKind::Text));
        assert!(ArgumentKind::Any.compatible(ArgumentKind::Numeric));
        assert!(ArgumentKind::Temporal.compatible(ArgumentKind::Any));
        assert!(!ArgumentKind::Text.compatible(ArgumentKind::Numeric));
    }
}
