//! Entity model: types, properties, keys and the frozen registry.

pub mod entity;
pub mod id;
pub mod registry;
pub mod sensing;

pub use entity::{
    ComplexType, EntityProperty, EntityType, EntityTypeId, Multiplicity, NavigationProperty,
    Property, ValueType,
};
pub use id::{Id, IdError, IdKind, IdManager};
pub use registry::{EntityTypeDef, LinkEnd, ModelBuilder, ModelError, ModelPlugin, ModelRegistry};
pub use sensing::{MultiDatastreams, SensingCore, sensing_model};
