use function_api::ArgumentKind::{Boolean, Numeric, Text};
use function_api::{FunctionArity, FunctionCategory, FunctionSpec};

use crate::util::{binary, unary};

const CATEGORY: FunctionCategory = FunctionCategory::String;

pub(crate) fn functions() -> Vec<FunctionSpec> {
    vec![
        binary("substringof", CATEGORY, [Text, Text], Boolean),
        binary("endswith", CATEGORY, [Text, Text], Boolean),
        binary("startswith", CATEGORY, [Text, Text], Boolean),
        binary("contains", CATEGORY, [Text, Text], Boolean),
        unary("length", CATEGORY, Text, Numeric),
        binary("indexof", CATEGORY, [Text, Text], Numeric),
        FunctionSpec::new("substring", CATEGORY, &[Text, Numeric], Text)
            .with_arity(FunctionArity::Range { min: 2, max: 3 }),
        unary("tolower", CATEGORY, Text, Text),
        unary("toupper", CATEGORY, Text, Text),
        unary("trim", CATEGORY, Text, Text),
        binary("concat", CATEGORY, [Text, Text], Text),
    ]
}
