use std::fmt;
use std::str::FromStr;

use crate::model::{EntityType, EntityTypeId, Id, ModelRegistry};

use super::PathError;

/// Protocol version a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    V1_0,
    #[default]
    V1_1,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::V1_0 => "v1.0",
            Version::V1_1 => "v1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1.0" => Ok(Version::V1_0),
            "v1.1" => Ok(Version::V1_1),
            other => Err(PathError::UnknownVersion(other.to_string())),
        }
    }
}

/// One node of a [`ResourcePath`]. `parent` is the index of the preceding
/// element in the same path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    EntitySet {
        entity_type: EntityTypeId,
        plural: String,
        /// Navigation property used to reach the set; `None` at the root.
        navigation: Option<String>,
        parent: Option<usize>,
    },
    Entity {
        entity_type: EntityTypeId,
        /// `None` when reached through a to-one navigation without a key.
        id: Option<Id>,
        navigation: Option<String>,
        parent: Option<usize>,
    },
    Property {
        name: String,
        parent: usize,
    },
    CustomProperty {
        name: String,
        parent: usize,
    },
    ArrayIndex {
        index: usize,
        parent: usize,
    },
}

impl PathElement {
    pub fn parent(&self) -> Option<usize> {
        match self {
            PathElement::EntitySet { parent, .. } | PathElement::Entity { parent, .. } => *parent,
            PathElement::Property { parent, .. }
            | PathElement::CustomProperty { parent, .. }
            | PathElement::ArrayIndex { parent, .. } => Some(*parent),
        }
    }

    pub fn entity_type(&self) -> Option<EntityTypeId> {
        match self {
            PathElement::EntitySet { entity_type, .. } | PathElement::Entity { entity_type, .. } => {
                Some(*entity_type)
            }
            _ => None,
        }
    }

    fn is_main_candidate(&self) -> bool {
        matches!(
            self,
            PathElement::EntitySet { .. } | PathElement::Entity { .. }
        )
    }

    fn shift_parent(&mut self, offset: usize) {
        match self {
            PathElement::EntitySet { parent, .. } | PathElement::Entity { parent, .. } => {
                *parent = parent.map(|idx| idx - offset);
            }
            PathElement::Property { parent, .. }
            | PathElement::CustomProperty { parent, .. }
            | PathElement::ArrayIndex { parent, .. } => *parent -= offset,
        }
    }
}

/// A parsed resource path: the element chain plus its trailing modifiers.
#[derive(Debug, Clone)]
pub struct ResourcePath {
    pub(crate) elements: Vec<PathElement>,
    pub(crate) main: usize,
    pub(crate) main_type: EntityTypeId,
    pub(crate) is_ref: bool,
    pub(crate) is_value: bool,
    pub(crate) service_root_url: String,
    pub(crate) version: Version,
    pub(crate) raw_path: String,
}

impl PartialEq for ResourcePath {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && self.main == other.main
            && self.is_ref == other.is_ref
            && self.is_value == other.is_value
    }
}

impl Eq for ResourcePath {}

impl ResourcePath {
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn main_element(&self) -> &PathElement {
        &self.elements[self.main]
    }

    pub fn main_index(&self) -> usize {
        self.main
    }

    pub fn last(&self) -> &PathElement {
        &self.elements[self.elements.len() - 1]
    }

    pub fn is_ref(&self) -> bool {
        self.is_ref
    }

    pub fn is_value(&self) -> bool {
        self.is_value
    }

    pub fn service_root_url(&self) -> &str {
        &self.service_root_url
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Whether the response is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self.main_element(), PathElement::EntitySet { .. })
            && self.main == self.elements.len() - 1
    }

    /// Index of the last entity addressed by an explicit key.
    pub fn identified_element(&self) -> Option<usize> {
        self.elements
            .iter()
            .rposition(|element| matches!(element, PathElement::Entity { id: Some(_), .. }))
    }

    pub fn main_entity_type_id(&self) -> EntityTypeId {
        self.main_type
    }

    pub fn main_entity_type<'r>(&self, registry: &'r ModelRegistry) -> &'r EntityType {
        registry.entity_type(self.main_type)
    }

    /// Drops every element before the set that holds the last keyed entity.
    /// A keyed entity is unique on its own, so the leading scope is
    /// redundant.
    pub fn compress(mut self) -> Self {
        let Some(identified) = self.identified_element() else {
            return self;
        };
        let Some(start) = self.elements[identified].parent() else {
            return self;
        };
        if start == 0 {
            return self;
        }

        self.elements.drain(..start);
        for element in self.elements.iter_mut().skip(1) {
            element.shift_parent(start);
        }
        if let Some(PathElement::EntitySet {
            navigation, parent, ..
        }) = self.elements.first_mut()
        {
            *navigation = None;
            *parent = None;
        }
        self.main -= start;
        self
    }

    /// Builds a path from a non-empty chain whose first element is an
    /// entity set.
    pub(crate) fn new(
        elements: Vec<PathElement>,
        root_type: EntityTypeId,
        service_root_url: &str,
        version: Version,
        raw_path: &str,
    ) -> Self {
        let main = elements
            .iter()
            .rposition(PathElement::is_main_candidate)
            .unwrap_or(0);
        let main_type = elements
            .get(main)
            .and_then(PathElement::entity_type)
            .unwrap_or(root_type);
        Self {
            elements,
            main,
            main_type,
            is_ref: false,
            is_value: false,
            service_root_url: service_root_url.to_string(),
            version,
            raw_path: raw_path.to_string(),
        }
    }
}

impl fmt::Display for ResourcePath {
    /// Renders the canonical form of the path, without the service root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            match element {
                PathElement::EntitySet {
                    plural, navigation, ..
                } => write!(f, "/{}", navigation.as_deref().unwrap_or(plural))?,
                PathElement::Entity {
                    id: Some(id),
                    navigation: None,
                    ..
                } => write!(f, "({id})")?,
                PathElement::Entity {
                    id, navigation, ..
                } => {
                    write!(f, "/{}", navigation.as_deref().unwrap_or_default())?;
                    if let Some(id) = id {
                        write!(f, "({id})")?;
                    }
                }
                PathElement::Property { name, .. } | PathElement::CustomProperty { name, .. } => {
                    write!(f, "/{name}")?
                }
                PathElement::ArrayIndex { index, .. } => write!(f, "[{index}]")?,
            }
        }
        if self.is_ref {
            f.write_str("/$ref")?;
        }
        if self.is_value {
            f.write_str("/$value")?;
        }
        Ok(())
    }
}
