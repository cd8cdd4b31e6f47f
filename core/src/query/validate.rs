use thiserror::Error;

use crate::model::{EntityType, ModelRegistry, Property, ValueType};

use super::ast::{Expression, PathSegment, PropertyPath, Query};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity_type} has no property {property}")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },
    #[error("{entity_type} has no navigation property {navigation}")]
    UnknownNavigation {
        entity_type: String,
        navigation: String,
    },
    #[error("a value of type {value_type} has no sub-property {segment}")]
    ClosedProperty { value_type: String, segment: String },
    #[error("{entity_type} cannot be addressed by {segment}")]
    NotAProperty {
        entity_type: String,
        segment: String,
    },
    #[error("custom link target {0} is not a registered entity type")]
    UnknownLinkTarget(String),
    #[error("{option} path {path} ends at an entity instead of a value")]
    EndsAtEntity { option: &'static str, path: String },
    #[error("$expand path {0} does not end at a navigation property")]
    NotExpandable(String),
    #[error("{root} is not reachable from {parent} through one navigation property")]
    Unreachable { parent: String, root: String },
}

/// Where a path has arrived after some of its segments.
#[derive(Clone, Copy)]
enum Target<'r> {
    Entity(&'r EntityType),
    Value(&'r ValueType),
    Open,
}

impl<'r> Target<'r> {
    fn for_value(value_type: &'r ValueType) -> Self {
        if value_type.is_open() {
            Target::Open
        } else {
            Target::Value(value_type)
        }
    }
}

struct Validator<'r> {
    registry: &'r ModelRegistry,
}

impl<'r> Validator<'r> {
    fn resolve(&self, root: &'r EntityType, path: &PropertyPath) -> Result<Target<'r>, ValidationError> {
        path.segments
            .iter()
            .try_fold(Target::Entity(root), |target, segment| self.step(target, segment))
    }

    fn step(&self, target: Target<'r>, segment: &PathSegment) -> Result<Target<'r>, ValidationError> {
        match (target, segment) {
            (Target::Entity(entity_type), PathSegment::PrimaryKey) => entity_type
                .entity_property(entity_type.primary_key())
                .map(|key| Target::Value(&key.value_type))
                .ok_or_else(|| ValidationError::UnknownProperty {
                    entity_type: entity_type.name().to_string(),
                    property: entity_type.primary_key().to_string(),
                }),
            (
                Target::Entity(entity_type),
                PathSegment::Navigation(name) | PathSegment::Property(name),
            ) => match entity_type.property(name) {
                Some(Property::Navigation(navigation)) => {
                    Ok(Target::Entity(self.registry.entity_type(navigation.target)))
                }
                Some(Property::Entity(property)) => Ok(Target::for_value(&property.value_type)),
                None if matches!(segment, PathSegment::Navigation(_)) => {
                    Err(ValidationError::UnknownNavigation {
                        entity_type: entity_type.name().to_string(),
                        navigation: name.clone(),
                    })
                }
                None => Err(ValidationError::UnknownProperty {
                    entity_type: entity_type.name().to_string(),
                    property: name.clone(),
                }),
            },
            (Target::Entity(entity_type), segment) => Err(ValidationError::NotAProperty {
                entity_type: entity_type.name().to_string(),
                segment: segment.to_string(),
            }),
            (Target::Open, PathSegment::CustomLink { target, .. }) => self
                .registry
                .entity_type_by_name(target)
                .map(Target::Entity)
                .ok_or_else(|| ValidationError::UnknownLinkTarget(target.clone())),
            (Target::Open, PathSegment::PrimaryKey) => Err(ValidationError::ClosedProperty {
                value_type: ValueType::Object.to_string(),
                segment: segment.to_string(),
            }),
            (Target::Open, _) => Ok(Target::Open),
            (
                Target::Value(ValueType::Complex(name)),
                PathSegment::Custom(field) | PathSegment::Property(field),
            ) => {
                let complex = self.registry.complex_type(name).ok_or_else(|| {
                    ValidationError::UnknownProperty {
                        entity_type: name.clone(),
                        property: field.clone(),
                    }
                })?;
                match complex.fields.get(field) {
                    Some(field_type) => Ok(Target::for_value(field_type)),
                    None if complex.open => Ok(Target::Open),
                    None => Err(ValidationError::UnknownProperty {
                        entity_type: complex.name.clone(),
                        property: field.clone(),
                    }),
                }
            }
            (Target::Value(ValueType::List(inner)), PathSegment::Index(_)) => {
                Ok(Target::for_value(inner))
            }
            (Target::Value(value_type), segment) => Err(ValidationError::ClosedProperty {
                value_type: value_type.to_string(),
                segment: segment.to_string(),
            }),
        }
    }

    fn value_paths(
        &self,
        root: &'r EntityType,
        option: &'static str,
        expression: &Expression,
    ) -> Result<(), ValidationError> {
        for path in expression.paths() {
            if let Target::Entity(_) = self.resolve(root, path)? {
                return Err(ValidationError::EndsAtEntity {
                    option,
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }

    fn query(&self, query: &Query, root: &'r EntityType) -> Result<(), ValidationError> {
        if let Some(filter) = &query.filter {
            self.value_paths(root, "$filter", filter)?;
        }
        for order in &query.order_by {
            self.value_paths(root, "$orderby", &order.expression)?;
        }
        for path in query.select.paths() {
            self.resolve(root, path)?;
        }
        for expand in &query.expand {
            let Target::Entity(target) = self.resolve(root, &expand.path)? else {
                return Err(ValidationError::NotExpandable(expand.path.to_string()));
            };
            if let Some(sub_query) = &expand.query {
                self.query(sub_query, target)?;
            }
        }
        Ok(())
    }
}

impl Query {
    /// Checks every path in the query against `root`. Expanded sub-queries
    /// are checked against the type their navigation leads to.
    pub fn validate(
        &self,
        registry: &ModelRegistry,
        root: &EntityType,
    ) -> Result<&Self, ValidationError> {
        Validator { registry }.query(self, root)?;
        log::trace!("query validated against {}", root.name());
        Ok(self)
    }

    /// Like [`Query::validate`], for a query whose `root` is reached from
    /// `parent` through one navigation property.
    pub fn validate_from(
        &self,
        registry: &ModelRegistry,
        parent: &EntityType,
        root: &EntityType,
    ) -> Result<&Self, ValidationError> {
        let reachable = parent
            .navigation_properties()
            .any(|navigation| navigation.target == root.id());
        if !reachable {
            return Err(ValidationError::Unreachable {
                parent: parent.name().to_string(),
                root: root.name().to_string(),
            });
        }
        self.validate(registry, root)
    }
}
