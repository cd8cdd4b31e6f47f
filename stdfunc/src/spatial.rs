use function_api::ArgumentKind::{Boolean, Geometry, Numeric, Text};
use function_api::{FunctionCategory::Spatial, FunctionSpec};

use crate::util::{binary, unary};

/// Binary topological predicates from the simple features model.
const PREDICATES: [&str; 8] = [
    "st_equals",
    "st_disjoint",
    "st_touches",
    "st_within",
    "st_overlaps",
    "st_crosses",
    "st_intersects",
    "st_contains",
];

pub(crate) fn functions() -> Vec<FunctionSpec> {
    let mut specs = vec![
        binary("geo.distance", Spatial, [Geometry, Geometry], Numeric),
        unary("geo.length", Spatial, Geometry, Numeric),
        binary("geo.intersects", Spatial, [Geometry, Geometry], Boolean),
        FunctionSpec::new("st_relate", Spatial, &[Geometry, Geometry, Text], Boolean),
    ];
    specs.extend(
        PREDICATES
            .iter()
            .map(|name| binary(name, Spatial, [Geometry, Geometry], Boolean)),
    );
    specs
}
