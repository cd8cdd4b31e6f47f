use function_api::ArgumentKind::{Boolean, Numeric, Temporal};
use function_api::{FunctionCategory::Temporal as Category, FunctionSpec};

use crate::util::{binary, nullary, unary};

/// Component extractors over a single instant.
const EXTRACTORS: [&str; 7] = [
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "fractionalseconds",
];

/// Allen-style relations between instants and intervals.
const RELATIONS: [&str; 7] = [
    "before", "after", "meets", "during", "overlaps", "starts", "finishes",
];

pub(crate) fn functions() -> Vec<FunctionSpec> {
    let mut specs: Vec<FunctionSpec> = EXTRACTORS
        .iter()
        .map(|name| unary(name, Category, Temporal, Numeric))
        .collect();
    specs.extend([
        unary("date", Category, Temporal, Temporal),
        unary("time", Category, Temporal, Temporal),
        unary("totaloffsetminutes", Category, Temporal, Numeric),
        nullary("now", Category, Temporal),
        nullary("mindatetime", Category, Temporal),
        nullary("maxdatetime", Category, Temporal),
    ]);
    specs.extend(
        RELATIONS
            .iter()
            .map(|name| binary(name, Category, [Temporal, Temporal], Boolean)),
    );
    specs
}
