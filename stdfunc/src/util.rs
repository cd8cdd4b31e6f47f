use function_api::{ArgumentKind, FunctionCategory, FunctionSpec};

pub(crate) fn nullary(
    name: &str,
    category: FunctionCategory,
    returns: ArgumentKind,
) -> FunctionSpec {
    FunctionSpec::new(name, category, &[], returns)
}

pub(crate) fn unary(
    name: &str,
    category: FunctionCategory,
    argument: ArgumentKind,
    returns: ArgumentKind,
) -> FunctionSpec {
    FunctionSpec::new(name, category, &[argument], returns)
}

pub(crate) fn binary(
    name: &str,
    category: FunctionCategory,
    arguments: [ArgumentKind; 2],
    returns: ArgumentKind,
) -> FunctionSpec {
    FunctionSpec::new(name, category, &arguments, returns)
}
