use function_api::ArgumentKind::Numeric;
use function_api::{FunctionCategory::Math, FunctionSpec};

use crate::util::unary;

pub(crate) fn functions() -> Vec<FunctionSpec> {
    vec![
        unary("round", Math, Numeric, Numeric),
        unary("floor", Math, Numeric, Numeric),
        unary("ceiling", Math, Numeric, Numeric),
    ]
}
