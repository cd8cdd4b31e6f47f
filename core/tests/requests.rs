mod support;

use pretty_assertions::assert_eq;
use sensorthings_core::query::SortDirection;
use sensorthings_core::{
    ParseContext, ParserSettings, PathError, QueryError, RequestError, ValidationError, Version,
    parse_request, parse_url,
};

use support::sensing;

const ROOT: &str = "https://example.org/sta/";

#[test]
fn query_is_validated_against_the_addressed_type() {
    let registry = sensing();
    let settings = ParserSettings::default();
    let ctx = ParseContext::new(&registry, &settings);

    let request = parse_request(
        &ctx,
        ROOT,
        Version::V1_1,
        "/Things(1)/Datastreams",
        "$filter=ObservedProperty/name eq 'temperature'&$orderby=name desc",
    )
    .unwrap();
    assert_eq!(request.path.main_entity_type(&registry).name(), "Datastream");
    assert_eq!(request.query.order_by[0].direction, SortDirection::Descending);

    assert_eq!(
        parse_request(&ctx, ROOT, Version::V1_1, "/Things", "$filter=result gt 1"),
        Err(RequestError::Validation(ValidationError::UnknownProperty {
            entity_type: "Thing".into(),
            property: "result".into(),
        }))
    );
}

#[test]
fn path_and_query_errors_are_kept_apart() {
    let registry = sensing();
    let settings = ParserSettings::default();
    let ctx = ParseContext::new(&registry, &settings);
    assert_eq!(
        parse_request(&ctx, ROOT, Version::V1_1, "/Robots", ""),
        Err(RequestError::Path(PathError::UnknownEntitySet("Robots".into())))
    );
    assert_eq!(
        parse_request(&ctx, ROOT, Version::V1_1, "/Things", "$size=3"),
        Err(RequestError::Query(QueryError::UnknownOption("$size".into())))
    );
}

#[test]
fn urls_split_into_version_path_and_query() {
    let registry = sensing();
    let settings = ParserSettings::default();
    let ctx = ParseContext::new(&registry, &settings);

    let request = parse_url(
        &ctx,
        ROOT,
        "https://example.org/sta/v1.0/Datastreams(4)/Observations?$top=3&$count=true",
    )
    .unwrap();
    assert_eq!(request.path.version(), Version::V1_0);
    assert_eq!(request.path.raw_path(), "/Datastreams(4)/Observations");
    assert_eq!(request.path.service_root_url(), ROOT);
    assert_eq!(request.query.top, Some(3));
    assert_eq!(request.query.count, Some(true));

    let bare = parse_url(&ctx, ROOT, "https://example.org/sta/v1.1/Things").unwrap();
    assert!(bare.query.is_empty());
    assert!(bare.path.is_collection());
}

#[test]
fn urls_outside_the_root_or_version_fail() {
    let registry = sensing();
    let settings = ParserSettings::default();
    let ctx = ParseContext::new(&registry, &settings);
    assert!(matches!(
        parse_url(&ctx, ROOT, "https://example.com/sta/v1.1/Things"),
        Err(RequestError::OutsideServiceRoot { .. })
    ));
    assert!(matches!(
        parse_url(&ctx, ROOT, "https://example.org/stats/v1.1/Things"),
        Err(RequestError::OutsideServiceRoot { .. })
    ));
    assert_eq!(
        parse_url(&ctx, ROOT, "https://example.org/sta/v9/Things"),
        Err(RequestError::Path(PathError::UnknownVersion("v9".into())))
    );
    assert_eq!(
        parse_url(&ctx, ROOT, "https://example.org/sta/v1.1"),
        Err(RequestError::Path(PathError::Empty))
    );
}
