mod support;

use pretty_assertions::assert_eq;
use sensorthings_core::ValidationError;
use sensorthings_core::model::ModelRegistry;
use sensorthings_core::query::{Expand, PathSegment, PropertyPath, Query};

use support::{entity, house_model, query, query_with_links, sensing};

fn check(registry: &ModelRegistry, root: &str, text: &str) -> Result<(), ValidationError> {
    let parsed = query(registry, text).unwrap();
    parsed.validate(registry, entity(registry, root)).map(|_| ())
}

fn check_with_links(registry: &ModelRegistry, root: &str, text: &str) -> Result<(), ValidationError> {
    let parsed = query_with_links(registry, text).unwrap();
    parsed.validate(registry, entity(registry, root)).map(|_| ())
}

#[test]
fn navigation_names_are_checked_per_type() {
    let registry = house_model();
    assert_eq!(
        check(&registry, "Room", "$filter=House/Room/id eq 1"),
        Err(ValidationError::UnknownNavigation {
            entity_type: "House".into(),
            navigation: "Room".into(),
        })
    );
    assert_eq!(check(&registry, "Furniture", "$filter=Room/House/name eq 'x'"), Ok(()));
}

#[test]
fn property_names_are_checked_per_type() {
    let registry = house_model();
    assert_eq!(
        check(&registry, "Room", "$filter=name eq 'x'"),
        Err(ValidationError::UnknownProperty {
            entity_type: "Room".into(),
            property: "name".into(),
        })
    );
    assert_eq!(
        check(&registry, "House", "$select=Furniture"),
        Err(ValidationError::UnknownNavigation {
            entity_type: "House".into(),
            navigation: "Furniture".into(),
        })
    );
}

#[test]
fn filters_and_orderings_must_end_at_values() {
    let registry = house_model();
    assert_eq!(
        check(&registry, "Room", "$filter=House eq null"),
        Err(ValidationError::EndsAtEntity {
            option: "$filter",
            path: "House".into(),
        })
    );
    assert_eq!(
        check(&registry, "Room", "$orderby=area,House desc"),
        Err(ValidationError::EndsAtEntity {
            option: "$orderby",
            path: "House".into(),
        })
    );
    assert_eq!(check(&registry, "Room", "$select=House,area"), Ok(()));
    assert_eq!(check(&registry, "Furniture", "$orderby=@iot.id desc"), Ok(()));
}

#[test]
fn expanded_sub_queries_use_the_target_type() {
    let registry = house_model();
    assert_eq!(
        check(
            &registry,
            "House",
            "$expand=Rooms($filter=area gt 10;$expand=Furniture($select=name))",
        ),
        Ok(())
    );
    assert_eq!(
        check(&registry, "House", "$expand=Rooms($filter=name eq 'x')"),
        Err(ValidationError::UnknownProperty {
            entity_type: "Room".into(),
            property: "name".into(),
        })
    );
    assert_eq!(
        check(&registry, "House", "$expand=Rooms/Furniture($orderby=value)"),
        Err(ValidationError::UnknownProperty {
            entity_type: "Furniture".into(),
            property: "value".into(),
        })
    );
}

#[test]
fn expands_must_end_at_an_entity() {
    let registry = house_model();
    assert_eq!(
        check(&registry, "House", "$expand=name"),
        Err(ValidationError::NotExpandable("name".into()))
    );
    assert_eq!(check(&registry, "House", "$expand=Neighbours/Rooms"), Ok(()));
}

#[test]
fn complex_and_list_values_are_closed() {
    let registry = house_model();
    assert_eq!(check(&registry, "House", "$filter=address/street eq 'x'"), Ok(()));
    assert_eq!(
        check(&registry, "House", "$filter=address/zip eq 'x'"),
        Err(ValidationError::UnknownProperty {
            entity_type: "Address".into(),
            property: "zip".into(),
        })
    );
    assert_eq!(
        check(&registry, "House", "$filter=name/first eq 'x'"),
        Err(ValidationError::ClosedProperty {
            value_type: "String".into(),
            segment: "first".into(),
        })
    );
    assert_eq!(check(&registry, "Room", "$filter=tags[0] eq 'red'"), Ok(()));
    assert_eq!(
        check(&registry, "Room", "$filter=area[0] eq 1"),
        Err(ValidationError::ClosedProperty {
            value_type: "Double".into(),
            segment: "0".into(),
        })
    );
}

#[test]
fn open_values_accept_any_sub_path() {
    let registry = house_model();
    assert_eq!(
        check(&registry, "House", "$filter=properties/a/b[1]/c eq 1&$select=properties/x"),
        Ok(())
    );
}

#[test]
fn custom_links_lead_back_into_the_model() {
    let registry = house_model();
    assert_eq!(
        check_with_links(&registry, "House", "$filter=properties/owner.House/name eq 'x'"),
        Ok(())
    );
    assert_eq!(
        check_with_links(&registry, "House", "$filter=properties/owner.House/area gt 1"),
        Err(ValidationError::UnknownProperty {
            entity_type: "House".into(),
            property: "area".into(),
        })
    );
    assert_eq!(
        check_with_links(&registry, "House", "$expand=properties/owner.House"),
        Ok(())
    );

    // Without the setting the same text is an opaque custom sub-path.
    assert_eq!(
        check(&registry, "House", "$filter=properties/owner.House/area gt 1"),
        Ok(())
    );
    assert_eq!(
        check(&registry, "House", "$expand=properties/owner.House"),
        Err(ValidationError::NotExpandable("properties/owner.House".into()))
    );
}

#[test]
fn unknown_link_targets_are_rejected() {
    let registry = house_model();
    let path = PropertyPath::new(vec![
        PathSegment::Property("properties".into()),
        PathSegment::CustomLink {
            name: "owner".into(),
            target: "Castle".into(),
        },
    ]);
    let query = Query {
        expand: vec![Expand::new(path)],
        ..Query::default()
    };
    assert_eq!(
        query.validate(&registry, entity(&registry, "House")),
        Err(ValidationError::UnknownLinkTarget("Castle".into()))
    );
}

#[test]
fn validate_returns_the_query() {
    let registry = sensing();
    let parsed = query(
        &registry,
        "$filter=Datastream/ObservedProperty/name eq 'temperature'&$expand=FeatureOfInterest",
    )
    .unwrap();
    let observation = entity(&registry, "Observation");
    assert_eq!(parsed.validate(&registry, observation), Ok(&parsed));
    assert_eq!(
        parsed.validate(&registry, entity(&registry, "Thing")),
        Err(ValidationError::UnknownNavigation {
            entity_type: "Thing".into(),
            navigation: "Datastream".into(),
        })
    );
}

#[test]
fn nested_sets_require_a_reachable_root() {
    let registry = house_model();
    let parsed = query(&registry, "$filter=area gt 1").unwrap();
    let house = entity(&registry, "House");
    let room = entity(&registry, "Room");
    assert_eq!(parsed.validate_from(&registry, house, room), Ok(&parsed));
    assert_eq!(
        parsed.validate_from(&registry, entity(&registry, "Furniture"), house),
        Err(ValidationError::Unreachable {
            parent: "Furniture".into(),
            root: "House".into(),
        })
    );

    let by_name = query(&registry, "$filter=name eq 'x'").unwrap();
    assert_eq!(by_name.validate_from(&registry, house, house), Ok(&by_name));
}
