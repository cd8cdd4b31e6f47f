#![allow(dead_code)]

use sensorthings_core::model::{
    ComplexType, EntityTypeDef, IdKind, LinkEnd, ModelBuilder, ModelRegistry, ValueType,
    sensing_model,
};
use sensorthings_core::query::{ParseContext, ParserSettings};
use sensorthings_core::{EntityType, Query, QueryError, parse_query};

/// Houses with rooms, rooms with furniture.
pub fn house_model() -> ModelRegistry {
    let mut builder = ModelBuilder::new();
    builder
        .add_complex_type(
            ComplexType::new("Address")
                .field("street", ValueType::String)
                .field("city", ValueType::String),
        )
        .unwrap();
    builder
        .add_entity_type(
            EntityTypeDef::new("House", "Houses")
                .required("name", ValueType::String)
                .property("properties", ValueType::Object)
                .property("address", ValueType::Complex("Address".into())),
        )
        .unwrap()
        .add_entity_type(
            EntityTypeDef::new("Room", "Rooms")
                .property("value", ValueType::Integer)
                .property("area", ValueType::Double)
                .property("tags", ValueType::List(Box::new(ValueType::String))),
        )
        .unwrap()
        .add_entity_type(
            EntityTypeDef::new("Furniture", "Furniture")
                .key("id", IdKind::String)
                .property("name", ValueType::String),
        )
        .unwrap();
    builder
        .link(LinkEnd::many("House", "Rooms"), LinkEnd::one("Room", "House").required())
        .link(LinkEnd::many("Room", "Furniture"), LinkEnd::one("Furniture", "Room"))
        .link_symmetric(LinkEnd::many("House", "Neighbours"));
    builder.finalize().unwrap()
}

pub fn sensing() -> ModelRegistry {
    sensing_model(IdKind::Long).unwrap()
}

pub fn query(registry: &ModelRegistry, text: &str) -> Result<Query, QueryError> {
    parse_query(text, &ParseContext::new(registry, &ParserSettings::default()))
}

pub fn query_with_links(registry: &ModelRegistry, text: &str) -> Result<Query, QueryError> {
    let settings = ParserSettings::default().with_custom_links(true);
    parse_query(text, &ParseContext::new(registry, &settings))
}

pub fn entity<'r>(registry: &'r ModelRegistry, name: &str) -> &'r EntityType {
    registry.entity_type_by_name(name).unwrap()
}
