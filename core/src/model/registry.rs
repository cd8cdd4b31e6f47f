use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use super::entity::{
    ComplexType, EntityProperty, EntityType, EntityTypeId, Multiplicity, NavigationProperty,
    Property, ValueType,
};
use super::id::IdKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("entity type {0} is already registered")]
    DuplicateEntityType(String),
    #[error("entity set {0} is already registered")]
    DuplicateEntitySet(String),
    #[error("complex type {0} is already registered")]
    DuplicateComplexType(String),
    #[error("entity type {entity_type} already has a property named {property}")]
    DuplicateProperty {
        entity_type: String,
        property: String,
    },
    #[error("entity type {0} is not registered")]
    UnknownEntityType(String),
    #[error("property {property} of {owner} refers to unregistered complex type {complex_type}")]
    UnknownComplexType {
        owner: String,
        property: String,
        complex_type: String,
    },
    #[error("plugin {0} was already applied")]
    DuplicatePlugin(String),
}

/// Contributes entity types, properties and relations to a model under
/// construction.
pub trait ModelPlugin {
    fn name(&self) -> &str;

    fn register(&self, builder: &mut ModelBuilder) -> Result<(), ModelError>;
}

/// Declaration of an entity type before the model is finalized.
#[derive(Debug, Clone)]
pub struct EntityTypeDef {
    name: String,
    plural: String,
    primary_key: String,
    id_kind: IdKind,
    properties: Vec<EntityProperty>,
}

impl EntityTypeDef {
    /// A type keyed by a long `id` property.
    pub fn new(name: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural: plural.into(),
            primary_key: "id".into(),
            id_kind: IdKind::default(),
            properties: Vec::new(),
        }
    }

    pub fn key(mut self, name: impl Into<String>, kind: IdKind) -> Self {
        self.primary_key = name.into();
        self.id_kind = kind;
        self
    }

    pub fn property(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.properties.push(EntityProperty::new(name, value_type));
        self
    }

    pub fn required(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.properties
            .push(EntityProperty::new(name, value_type).required());
        self
    }
}

/// One side of a navigation relation: `entity_type.property` leading to the
/// other side's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEnd {
    pub entity_type: String,
    pub property: String,
    pub multiplicity: Multiplicity,
    pub required: bool,
}

impl LinkEnd {
    pub fn one(entity_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            property: property.into(),
            multiplicity: Multiplicity::One,
            required: false,
        }
    }

    pub fn many(entity_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            multiplicity: Multiplicity::Many,
            ..Self::one(entity_type, property)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Link {
    from: LinkEnd,
    to: LinkEnd,
}

/// Mutable model used during start-up. [`ModelBuilder::finalize`] consumes it
/// and yields the frozen [`ModelRegistry`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    types: Vec<EntityTypeDef>,
    extra_properties: Vec<(String, EntityProperty)>,
    complex_types: BTreeMap<String, ComplexType>,
    links: Vec<Link>,
    plugins: Vec<String>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, plugin: &dyn ModelPlugin) -> Result<&mut Self, ModelError> {
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            return Err(ModelError::DuplicatePlugin(name));
        }
        plugin.register(self)?;
        log::debug!("model plugin {name} registered");
        self.plugins.push(name);
        Ok(self)
    }

    pub fn add_entity_type(&mut self, def: EntityTypeDef) -> Result<&mut Self, ModelError> {
        if self.types.iter().any(|existing| existing.name == def.name) {
            return Err(ModelError::DuplicateEntityType(def.name));
        }
        if self.types.iter().any(|existing| existing.plural == def.plural) {
            return Err(ModelError::DuplicateEntitySet(def.plural));
        }
        self.types.push(def);
        Ok(self)
    }

    /// Adds a property to a type that may be declared by another plugin.
    pub fn add_property(
        &mut self,
        entity_type: impl Into<String>,
        property: EntityProperty,
    ) -> &mut Self {
        self.extra_properties.push((entity_type.into(), property));
        self
    }

    pub fn add_complex_type(&mut self, complex: ComplexType) -> Result<&mut Self, ModelError> {
        if self.complex_types.contains_key(&complex.name) {
            return Err(ModelError::DuplicateComplexType(complex.name));
        }
        self.complex_types.insert(complex.name.clone(), complex);
        Ok(self)
    }

    /// Declares `from.property` and its inverse `to.property`.
    pub fn link(&mut self, from: LinkEnd, to: LinkEnd) -> &mut Self {
        self.links.push(Link { from, to });
        self
    }

    /// Declares a self-relation that is its own inverse.
    pub fn link_symmetric(&mut self, end: LinkEnd) -> &mut Self {
        self.links.push(Link {
            from: end.clone(),
            to: end,
        });
        self
    }

    pub fn finalize(self) -> Result<ModelRegistry, ModelError> {
        let mut types = Vec::with_capacity(self.types.len());
        let mut by_name = HashMap::new();
        let mut by_plural = HashMap::new();

        for (idx, def) in self.types.into_iter().enumerate() {
            let id = EntityTypeId(idx);
            let mut entity_type = EntityType {
                id,
                name: def.name,
                plural: def.plural,
                primary_key: def.primary_key.clone(),
                id_kind: def.id_kind,
                properties: Vec::new(),
                index: HashMap::new(),
            };
            let key = EntityProperty::new(def.primary_key, ValueType::Id);
            for property in std::iter::once(key).chain(def.properties) {
                add_property(&mut entity_type, Property::Entity(property))?;
            }
            by_name.insert(entity_type.name.clone(), id);
            by_plural.insert(entity_type.plural.clone(), id);
            types.push(entity_type);
        }

        for (owner, property) in self.extra_properties {
            let id = *by_name
                .get(&owner)
                .ok_or_else(|| ModelError::UnknownEntityType(owner.clone()))?;
            add_property(&mut types[id.0], Property::Entity(property))?;
        }

        for link in self.links {
            let from = *by_name
                .get(&link.from.entity_type)
                .ok_or_else(|| ModelError::UnknownEntityType(link.from.entity_type.clone()))?;
            let to = *by_name
                .get(&link.to.entity_type)
                .ok_or_else(|| ModelError::UnknownEntityType(link.to.entity_type.clone()))?;
            let symmetric = from == to && link.from.property == link.to.property;

            add_property(&mut types[from.0], navigation(&link.from, &link.to, to))?;
            if !symmetric {
                add_property(&mut types[to.0], navigation(&link.to, &link.from, from))?;
            }
        }

        for entity_type in &types {
            for property in entity_type.entity_properties() {
                check_complex(&self.complex_types, &entity_type.name, property)?;
            }
        }

        let mut navigation_names = HashSet::new();
        let mut entity_property_names = HashSet::new();
        for entity_type in &types {
            for property in entity_type.properties() {
                match property {
                    Property::Navigation(nav) => navigation_names.insert(nav.name.clone()),
                    Property::Entity(ep) => entity_property_names.insert(ep.name.clone()),
                };
            }
        }

        log::debug!(
            "model finalized with {} entity types and {} complex types",
            types.len(),
            self.complex_types.len()
        );

        Ok(ModelRegistry {
            types,
            by_name,
            by_plural,
            complex_types: self.complex_types.into_iter().collect(),
            navigation_names,
            entity_property_names,
            plugins: self.plugins,
        })
    }
}

fn navigation(from: &LinkEnd, to: &LinkEnd, target: EntityTypeId) -> Property {
    Property::Navigation(NavigationProperty {
        name: from.property.clone(),
        target,
        multiplicity: from.multiplicity,
        inverse: to.property.clone(),
        required: from.required,
    })
}

fn add_property(entity_type: &mut EntityType, property: Property) -> Result<(), ModelError> {
    let name = property.name().to_string();
    if entity_type.push(property) {
        Ok(())
    } else {
        Err(ModelError::DuplicateProperty {
            entity_type: entity_type.name.clone(),
            property: name,
        })
    }
}

fn check_complex(
    complex_types: &BTreeMap<String, ComplexType>,
    owner: &str,
    property: &EntityProperty,
) -> Result<(), ModelError> {
    let mut value_type = &property.value_type;
    while let ValueType::List(inner) = value_type {
        value_type = inner;
    }
    match value_type {
        ValueType::Complex(name) if !complex_types.contains_key(name) => {
            Err(ModelError::UnknownComplexType {
                owner: owner.to_string(),
                property: property.name.clone(),
                complex_type: name.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// The frozen entity model. Read-only after [`ModelBuilder::finalize`], so it
/// can be shared across request workers behind an `Arc`.
#[derive(Debug)]
pub struct ModelRegistry {
    types: Vec<EntityType>,
    by_name: HashMap<String, EntityTypeId>,
    by_plural: HashMap<String, EntityTypeId>,
    complex_types: HashMap<String, ComplexType>,
    navigation_names: HashSet<String>,
    entity_property_names: HashSet<String>,
    plugins: Vec<String>,
}

impl ModelRegistry {
    /// Panics if `id` was issued by a different registry.
    pub fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        &self.types[id.0]
    }

    pub fn get(&self, id: EntityTypeId) -> Option<&EntityType> {
        self.types.get(id.0)
    }

    pub fn entity_type_by_name(&self, name: &str) -> Option<&EntityType> {
        self.by_name.get(name).map(|id| &self.types[id.0])
    }

    pub fn entity_set(&self, plural: &str) -> Option<&EntityType> {
        self.by_plural.get(plural).map(|id| &self.types[id.0])
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.types.iter()
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    /// Whether any entity type declares a navigation property with this name.
    pub fn is_navigation_name(&self, name: &str) -> bool {
        self.navigation_names.contains(name)
    }

    /// Whether any entity type declares an entity property with this name.
    pub fn is_entity_property_name(&self, name: &str) -> bool {
        self.entity_property_names.contains(name)
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }
}
