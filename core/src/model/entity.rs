use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::id::IdKind;

/// Handle of an entity type inside the [`ModelRegistry`](super::ModelRegistry)
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(pub(crate) usize);

/// Declared type of an entity property's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Id,
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    TimeInstant,
    TimeInterval,
    /// An instant or an interval.
    TimeValue,
    Geometry,
    /// Schema-less JSON object; any sub-path is accepted.
    Object,
    /// Schema-less JSON value of any shape; any sub-path is accepted.
    Any,
    /// A registered complex type.
    Complex(String),
    List(Box<ValueType>),
}

impl ValueType {
    /// Open values accept custom sub-properties without further checks.
    pub fn is_open(&self) -> bool {
        matches!(self, ValueType::Object | ValueType::Any)
    }

    pub fn accepts_index(&self) -> bool {
        matches!(self, ValueType::List(_)) || self.is_open()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Complex(name) => f.write_str(name),
            ValueType::List(inner) => write!(f, "List<{inner}>"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A structured value type with named fields, such as a unit of measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    pub fields: BTreeMap<String, ValueType>,
    /// Whether undeclared fields are accepted as custom properties.
    pub open: bool,
}

impl ComplexType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            open: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.fields.insert(name.into(), value_type);
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProperty {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
}

impl EntityProperty {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProperty {
    pub name: String,
    pub target: EntityTypeId,
    pub multiplicity: Multiplicity,
    /// Name of the navigation property on `target` that leads back here.
    pub inverse: String,
    pub required: bool,
}

impl NavigationProperty {
    pub fn is_to_many(&self) -> bool {
        self.multiplicity == Multiplicity::Many
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Entity(EntityProperty),
    Navigation(NavigationProperty),
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Entity(property) => &property.name,
            Property::Navigation(property) => &property.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityType {
    pub(crate) id: EntityTypeId,
    pub(crate) name: String,
    pub(crate) plural: String,
    pub(crate) primary_key: String,
    pub(crate) id_kind: IdKind,
    pub(crate) properties: Vec<Property>,
    pub(crate) index: HashMap<String, usize>,
}

impl EntityType {
    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity-set name used in URLs.
    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.index.get(name).map(|idx| &self.properties[*idx])
    }

    pub fn entity_property(&self, name: &str) -> Option<&EntityProperty> {
        match self.property(name)? {
            Property::Entity(property) => Some(property),
            Property::Navigation(_) => None,
        }
    }

    pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        match self.property(name)? {
            Property::Navigation(property) => Some(property),
            Property::Entity(_) => None,
        }
    }

    /// Properties in registration order, primary key first.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn entity_properties(&self) -> impl Iterator<Item = &EntityProperty> {
        self.properties.iter().filter_map(|property| match property {
            Property::Entity(property) => Some(property),
            Property::Navigation(_) => None,
        })
    }

    pub fn navigation_properties(&self) -> impl Iterator<Item = &NavigationProperty> {
        self.properties.iter().filter_map(|property| match property {
            Property::Navigation(property) => Some(property),
            Property::Entity(_) => None,
        })
    }

    pub(crate) fn push(&mut self, property: Property) -> bool {
        if self.index.contains_key(property.name()) {
            return false;
        }
        self.index
            .insert(property.name().to_string(), self.properties.len());
        self.properties.push(property);
        true
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
