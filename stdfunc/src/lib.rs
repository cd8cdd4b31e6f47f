//! The standard filter functions of the sensing API.

mod math;
mod spatial;
mod string;
mod temporal;
mod util;

use function_api::{FunctionRegistry, FunctionSpec};
use once_cell::sync::Lazy;

static STANDARD_FUNCTIONS: Lazy<FunctionRegistry> = Lazy::new(|| build_registry(all_functions()));

/// A table with a name clash is unusable; it is logged and replaced by an
/// empty catalog, so every call then fails as an unknown function.
fn build_registry(specs: Vec<FunctionSpec>) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    match registry.register_all(specs) {
        Ok(()) => {
            log::debug!("registered {} standard functions", registry.len());
            registry
        }
        Err(err) => {
            log::error!("standard function table rejected: {err}");
            FunctionRegistry::new()
        }
    }
}

/// Every standard function signature, grouped by category.
pub fn all_functions() -> Vec<FunctionSpec> {
    let mut specs = Vec::new();
    specs.extend(string::functions());
    specs.extend(temporal::functions());
    specs.extend(math::functions());
    specs.extend(spatial::functions());
    specs
}

/// The shared, read-only registry of standard functions.
pub fn registry() -> &'static FunctionRegistry {
    &STANDARD_FUNCTIONS
}

/// A fresh registry seeded with the standard functions, for callers that
/// add their own.
pub fn extendable_registry() -> FunctionRegistry {
    STANDARD_FUNCTIONS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use function_api::{ArgumentKind, FunctionCategory};

    #[test]
    fn standard_tables_have_unique_names() {
        let mut fresh = FunctionRegistry::new();
        fresh
            .register_all(all_functions())
            .expect("no duplicate names");
        assert_eq!(fresh.len(), all_functions().len());
        assert_eq!(registry().len(), fresh.len());
    }

    #[test]
    fn clashing_tables_leave_an_empty_catalog() {
        let mut specs = string::functions();
        specs.extend(string::functions());
        assert!(build_registry(specs).is_empty());
        assert!(!build_registry(math::functions()).is_empty());
    }

    #[test]
    fn dotted_spatial_names_resolve() {
        let spec = registry().resolve("geo.distance", 2).expect("geo.distance");
        assert_eq!(spec.category, FunctionCategory::Spatial);
        assert_eq!(spec.returns, ArgumentKind::Numeric);
    }

    #[test]
    fn extendable_registry_is_independent() {
        let mut own = extendable_registry();
        own.register(FunctionSpec::new(
            "shout",
            FunctionCategory::String,
            &[ArgumentKind::Text],
            ArgumentKind::Text,
        ))
        .unwrap();
        assert!(own.contains("shout"));
        assert!(!registry().contains("shout"));
    }
}
