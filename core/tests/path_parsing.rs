mod support;

use pretty_assertions::assert_eq;
use sensorthings_core::model::{Id, IdKind, Property, sensing_model};
use sensorthings_core::{PathElement, PathError, ResourcePath, Version, parse_path};

use support::{house_model, sensing};

const ROOT: &str = "http://example.org/sta";

fn parse(registry: &sensorthings_core::ModelRegistry, path: &str) -> Result<ResourcePath, PathError> {
    parse_path(registry, ROOT, Version::V1_1, path)
}

#[test]
fn keyed_entity_sets_address_one_entity() {
    let registry = sensing();
    for entity_type in registry.entity_types() {
        let path = parse(&registry, &format!("/{}(42)", entity_type.plural())).unwrap();
        assert_eq!(
            path.main_element(),
            &PathElement::Entity {
                entity_type: entity_type.id(),
                id: Some(Id::Long(42)),
                navigation: None,
                parent: Some(0),
            }
        );
        assert_eq!(path.main_entity_type(&registry).name(), entity_type.name());
        assert!(!path.is_collection());
    }
}

#[test]
fn declared_properties_extend_the_chain() {
    let registry = sensing();
    for entity_type in registry.entity_types() {
        for property in entity_type.entity_properties() {
            let raw = format!("/{}(7)/{}", entity_type.plural(), property.name);
            let path = parse(&registry, &raw).unwrap();
            assert_eq!(
                path.elements(),
                &[
                    PathElement::EntitySet {
                        entity_type: entity_type.id(),
                        plural: entity_type.plural().to_string(),
                        navigation: None,
                        parent: None,
                    },
                    PathElement::Entity {
                        entity_type: entity_type.id(),
                        id: Some(Id::Long(7)),
                        navigation: None,
                        parent: Some(0),
                    },
                    PathElement::Property {
                        name: property.name.clone(),
                        parent: 1,
                    },
                ]
            );
            assert!(!path.is_value());
            assert_eq!(path.main_index(), 1);

            let value = parse(&registry, &format!("{raw}/$value")).unwrap();
            assert!(value.is_value());
            assert_eq!(value.elements(), path.elements());
        }
    }
}

#[test]
fn to_one_navigation_leaves_the_id_unresolved() {
    let registry = sensing();
    let path = parse(&registry, "/Observations(11)/Datastream/Thing").unwrap();
    let thing = registry.entity_type_by_name("Thing").unwrap();
    assert_eq!(
        path.last(),
        &PathElement::Entity {
            entity_type: thing.id(),
            id: None,
            navigation: Some("Thing".into()),
            parent: Some(2),
        }
    );
    assert_eq!(path.main_index(), 3);
    assert_eq!(path.identified_element(), Some(1));
}

#[test]
fn to_many_navigation_yields_a_scoped_set() {
    let registry = sensing();
    let path = parse(&registry, "/Things(1)/Datastreams(2)/Observations").unwrap();
    let observation = registry.entity_set("Observations").unwrap();
    assert_eq!(
        path.main_element(),
        &PathElement::EntitySet {
            entity_type: observation.id(),
            plural: "Observations".into(),
            navigation: Some("Observations".into()),
            parent: Some(3),
        }
    );
    assert!(path.is_collection());
    assert_eq!(path.to_string(), "/Things(1)/Datastreams(2)/Observations");
}

#[test]
fn compression_drops_redundant_scope() {
    let registry = sensing();
    let long = parse(&registry, "/Datastreams(5)/Observations(11)/Datastream/Thing").unwrap();
    let short = parse(&registry, "/Observations(11)/Datastream/Thing").unwrap();

    let compressed = long.clone().compress();
    assert_eq!(compressed, short);
    assert_eq!(compressed.clone().compress(), compressed);
    assert_eq!(
        compressed.main_entity_type(&registry).name(),
        long.main_entity_type(&registry).name()
    );
    assert_eq!(compressed.last().entity_type(), long.last().entity_type());
    assert_eq!(compressed.to_string(), "/Observations(11)/Datastream/Thing");
}

#[test]
fn compression_keeps_paths_without_inner_keys() {
    let registry = sensing();
    let path = parse(&registry, "/Things(1)/Locations").unwrap();
    assert_eq!(path.clone().compress(), path);

    let unkeyed = parse(&registry, "/Things").unwrap();
    assert_eq!(unkeyed.clone().compress(), unkeyed);
}

#[test]
fn compression_keeps_trailing_properties() {
    let registry = sensing();
    let path = parse(&registry, "/Things(1)/Datastreams(2)/unitOfMeasurement/symbol/$value").unwrap();
    let compressed = path.compress();
    assert!(compressed.is_value());
    assert_eq!(
        compressed.to_string(),
        "/Datastreams(2)/unitOfMeasurement/symbol/$value"
    );
}

#[test]
fn ref_and_value_suffixes() {
    let registry = sensing();
    assert!(parse(&registry, "/Things/$ref").unwrap().is_ref());
    assert!(parse(&registry, "/Things(1)/Locations/$ref").unwrap().is_ref());

    for bad in [
        "/$ref",
        "/Things(1)/$ref/$value",
        "/Things(1)/$value",
        "/Things(1)/name/$ref",
        "/Things(1)/$ref/Locations",
        "/Things(1)/name/$value(1)",
    ] {
        assert!(
            matches!(parse(&registry, bad), Err(PathError::MisplacedSuffix { .. })),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn malformed_paths_fail() {
    let registry = sensing();
    assert_eq!(parse(&registry, ""), Err(PathError::Empty));
    assert_eq!(parse(&registry, "/"), Err(PathError::Empty));
    assert!(matches!(parse(&registry, "/Things/"), Err(PathError::Syntax { .. })));
    assert!(matches!(parse(&registry, "/Things(1"), Err(PathError::Syntax { .. })));
    assert_eq!(
        parse(&registry, "/Houses"),
        Err(PathError::UnknownEntitySet("Houses".into()))
    );
    assert_eq!(
        parse(&registry, "/Things(1)/colour"),
        Err(PathError::UnknownProperty {
            entity_type: "Thing".into(),
            property: "colour".into(),
        })
    );
    assert!(matches!(
        parse(&registry, "/Things(abc)"),
        Err(PathError::InvalidKey { .. })
    ));
    assert!(matches!(
        parse(&registry, "/Things(9223372036854775808)"),
        Err(PathError::InvalidKey { .. })
    ));
    assert_eq!(
        parse(&registry, "/Observations(1)/Datastream(2)"),
        Err(PathError::KeyNotAllowed("Datastream".into()))
    );
    assert!(matches!(
        parse(&registry, "/Things/Locations"),
        Err(PathError::UnexpectedSegment { .. })
    ));
    assert!(matches!(
        parse(&registry, "/Things(1)/name/first"),
        Err(PathError::UnexpectedSegment { .. })
    ));
}

#[test]
fn long_keys_cover_the_boundaries() {
    let registry = sensing();
    for key in [i64::MIN, -1, 0, i64::MAX] {
        let path = parse(&registry, &format!("/Things({key})")).unwrap();
        assert!(matches!(
            path.main_element(),
            PathElement::Entity { id: Some(Id::Long(found)), .. } if *found == key
        ));
    }
}

#[test]
fn string_keys_use_doubled_quotes() {
    let registry = sensing_model(IdKind::String).unwrap();
    let path = parse(&registry, "/Things('it''s/here')/Datastreams").unwrap();
    assert!(matches!(
        &path.elements()[1],
        PathElement::Entity { id: Some(Id::String(key)), .. } if key == "it's/here"
    ));
    assert_eq!(path.to_string(), "/Things('it''s/here')/Datastreams");
    assert!(matches!(
        parse(&registry, "/Things(12)"),
        Err(PathError::InvalidKey { .. })
    ));
}

#[test]
fn custom_sub_paths_share_one_shape() {
    let registry = sensing();
    let bracket = parse(&registry, "/Things(1)/properties/a[2]/b").unwrap();
    let slash = parse(&registry, "/Things(1)/properties/a/2/b").unwrap();
    assert_eq!(bracket, slash);

    let shapes = [
        "/Things(1)/properties/a/2[3]",
        "/Things(1)/properties/a[2][3]",
        "/Things(1)/properties/a/2/3",
        "/Things(1)/properties/a[2]/3",
    ];
    let parsed: Vec<_> = shapes.iter().map(|raw| parse(&registry, raw).unwrap()).collect();
    for other in &parsed[1..] {
        assert_eq!(other, &parsed[0]);
    }
    assert!(matches!(
        parsed[0].last(),
        PathElement::ArrayIndex { index: 3, parent: 4 }
    ));
    assert_eq!(parsed[0].to_string(), "/Things(1)/properties/a[2][3]");
}

#[test]
fn complex_and_list_properties_are_typed() {
    let registry = sensing();
    assert!(parse(&registry, "/Datastreams(1)/unitOfMeasurement/symbol").is_ok());
    assert_eq!(
        parse(&registry, "/Datastreams(1)/unitOfMeasurement/colour"),
        Err(PathError::UnknownProperty {
            entity_type: "UnitOfMeasurement".into(),
            property: "colour".into(),
        })
    );

    let houses = house_model();
    assert!(parse(&houses, "/Rooms(1)/tags[0]").is_ok());
    assert!(parse(&houses, "/Rooms(1)/tags/0").is_ok());
    assert!(matches!(
        parse(&houses, "/Rooms(1)/tags/first"),
        Err(PathError::UnexpectedSegment { .. })
    ));
    assert!(matches!(
        parse(&houses, "/Rooms(1)/area[0]"),
        Err(PathError::UnexpectedSegment { .. })
    ));
}

#[test]
fn symmetric_relations_navigate_to_the_same_type() {
    let registry = house_model();
    let path = parse(&registry, "/Houses(1)/Neighbours(2)/Rooms").unwrap();
    let house = registry.entity_type_by_name("House").unwrap();
    assert_eq!(path.elements()[2].entity_type(), Some(house.id()));
    let Some(Property::Navigation(neighbours)) = house.property("Neighbours") else {
        panic!("Neighbours is a navigation property");
    };
    assert_eq!(neighbours.inverse, "Neighbours");
}

#[test]
fn raw_text_and_root_are_kept_but_not_compared() {
    let registry = sensing();
    let a = parse(&registry, "/Things(1)").unwrap();
    let b = parse_path(&registry, "http://other", Version::V1_0, "/Things(01)").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.raw_path(), "/Things(1)");
    assert_eq!(a.service_root_url(), ROOT);
    assert_eq!(b.version(), Version::V1_0);
    assert_eq!("v1.0".parse::<Version>(), Ok(Version::V1_0));
    assert!("v2.0".parse::<Version>().is_err());
}
