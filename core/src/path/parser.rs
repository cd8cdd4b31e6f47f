use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::error::{VerboseError, convert_error};
use nom::multi::{many0, many1};
use nom::sequence::{delimited, preceded, tuple};

use crate::model::{EntityType, ModelRegistry, Property, ValueType};

use super::PathError;
use super::element::{PathElement, ResourcePath, Version};

type IResult<'a, O> = nom::IResult<&'a str, O, VerboseError<&'a str>>;

const REF: &str = "$ref";
const VALUE: &str = "$value";

#[derive(Debug, PartialEq, Eq)]
struct RawSegment<'a> {
    name: &'a str,
    key: Option<&'a str>,
    indices: Vec<usize>,
}

fn segment_name(input: &str) -> IResult<&str> {
    take_while1(|c: char| !matches!(c, '/' | '(' | ')' | '[' | ']'))(input)
}

fn quoted_key(input: &str) -> IResult<&str> {
    recognize(tuple((
        char('\''),
        many0(alt((tag("''"), take_while1(|c: char| c != '\'')))),
        char('\''),
    )))(input)
}

fn key_text(input: &str) -> IResult<&str> {
    recognize(many0(alt((
        quoted_key,
        take_while1(|c: char| c != ')' && c != '\''),
    ))))(input)
}

fn index(input: &str) -> IResult<usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

fn segment(input: &str) -> IResult<RawSegment<'_>> {
    let (input, name) = segment_name(input)?;
    let (input, key) = opt(delimited(char('('), key_text, char(')')))(input)?;
    let (input, indices) = many0(delimited(char('['), index, char(']')))(input)?;
    Ok((input, RawSegment { name, key, indices }))
}

fn segments(input: &str) -> IResult<Vec<RawSegment<'_>>> {
    many1(preceded(char('/'), segment))(input)
}

/// What the next segment is resolved against.
#[derive(Clone, Copy)]
enum Cursor<'r> {
    Start,
    Set(&'r EntityType),
    Entity(&'r EntityType),
    Value(&'r ValueType),
    Open,
}

impl<'r> Cursor<'r> {
    fn for_value(value_type: &'r ValueType) -> Self {
        if value_type.is_open() {
            Cursor::Open
        } else {
            Cursor::Value(value_type)
        }
    }
}

struct Resolver<'r> {
    registry: &'r ModelRegistry,
    elements: Vec<PathElement>,
    cursor: Cursor<'r>,
}

impl<'r> Resolver<'r> {
    fn parent(&self) -> usize {
        self.elements.len() - 1
    }

    fn step(&mut self, segment: &RawSegment<'_>) -> Result<(), PathError> {
        match self.cursor {
            Cursor::Start => {
                let entity_type = self
                    .registry
                    .entity_set(segment.name)
                    .ok_or_else(|| PathError::UnknownEntitySet(segment.name.to_string()))?;
                self.elements.push(PathElement::EntitySet {
                    entity_type: entity_type.id(),
                    plural: entity_type.plural().to_string(),
                    navigation: None,
                    parent: None,
                });
                self.enter_set(entity_type, segment.key)?;
            }
            Cursor::Set(entity_type) => {
                return Err(PathError::UnexpectedSegment {
                    segment: segment.name.to_string(),
                    reason: format!("the {} collection must be keyed first", entity_type.plural()),
                });
            }
            Cursor::Entity(entity_type) => self.entity_step(entity_type, segment)?,
            Cursor::Value(_) | Cursor::Open => {
                if segment.key.is_some() {
                    return Err(PathError::KeyNotAllowed(segment.name.to_string()));
                }
                self.value_step(segment.name)?;
            }
        }

        for index in &segment.indices {
            self.push_index(*index, segment.name)?;
        }
        Ok(())
    }

    fn enter_set(&mut self, entity_type: &'r EntityType, key: Option<&str>) -> Result<(), PathError> {
        let Some(key) = key else {
            self.cursor = Cursor::Set(entity_type);
            return Ok(());
        };
        let id = entity_type
            .id_kind()
            .manager()
            .parse_id(key)
            .map_err(|source| PathError::InvalidKey {
                entity_type: entity_type.name().to_string(),
                source,
            })?;
        let parent = self.parent();
        self.elements.push(PathElement::Entity {
            entity_type: entity_type.id(),
            id: Some(id),
            navigation: None,
            parent: Some(parent),
        });
        self.cursor = Cursor::Entity(entity_type);
        Ok(())
    }

    fn entity_step(
        &mut self,
        entity_type: &'r EntityType,
        segment: &RawSegment<'_>,
    ) -> Result<(), PathError> {
        let parent = self.parent();
        match entity_type.property(segment.name) {
            Some(Property::Navigation(navigation)) => {
                let target = self.registry.entity_type(navigation.target);
                if navigation.is_to_many() {
                    self.elements.push(PathElement::EntitySet {
                        entity_type: target.id(),
                        plural: target.plural().to_string(),
                        navigation: Some(navigation.name.clone()),
                        parent: Some(parent),
                    });
                    self.enter_set(target, segment.key)?;
                } else {
                    if segment.key.is_some() {
                        return Err(PathError::KeyNotAllowed(segment.name.to_string()));
                    }
                    self.elements.push(PathElement::Entity {
                        entity_type: target.id(),
                        id: None,
                        navigation: Some(navigation.name.clone()),
                        parent: Some(parent),
                    });
                    self.cursor = Cursor::Entity(target);
                }
            }
            Some(Property::Entity(property)) => {
                if segment.key.is_some() {
                    return Err(PathError::KeyNotAllowed(segment.name.to_string()));
                }
                self.elements.push(PathElement::Property {
                    name: property.name.clone(),
                    parent,
                });
                self.cursor = Cursor::for_value(&property.value_type);
            }
            None => {
                return Err(PathError::UnknownProperty {
                    entity_type: entity_type.name().to_string(),
                    property: segment.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn value_step(&mut self, name: &str) -> Result<(), PathError> {
        let parent = self.parent();
        let cursor = self.cursor;
        match cursor {
            Cursor::Open => {
                let element = match index(name) {
                    Ok(("", index)) => PathElement::ArrayIndex { index, parent },
                    _ => PathElement::CustomProperty {
                        name: name.to_string(),
                        parent,
                    },
                };
                self.elements.push(element);
            }
            Cursor::Value(ValueType::List(_)) => {
                let index = match index(name) {
                    Ok(("", index)) => index,
                    _ => {
                        return Err(PathError::UnexpectedSegment {
                            segment: name.to_string(),
                            reason: "list values are addressed by index".into(),
                        });
                    }
                };
                self.push_index(index, name)?;
            }
            Cursor::Value(ValueType::Complex(complex_name)) => {
                let complex = self.registry.complex_type(complex_name).ok_or_else(|| {
                    PathError::UnknownProperty {
                        entity_type: complex_name.clone(),
                        property: name.to_string(),
                    }
                })?;
                self.elements.push(PathElement::CustomProperty {
                    name: name.to_string(),
                    parent,
                });
                self.cursor = match complex.fields.get(name) {
                    Some(field) => Cursor::for_value(field),
                    None if complex.open => Cursor::Open,
                    None => {
                        return Err(PathError::UnknownProperty {
                            entity_type: complex.name.clone(),
                            property: name.to_string(),
                        });
                    }
                };
            }
            _ => {
                return Err(PathError::UnexpectedSegment {
                    segment: name.to_string(),
                    reason: "the preceding property has no sub-properties".into(),
                });
            }
        }
        Ok(())
    }

    fn push_index(&mut self, index: usize, segment: &str) -> Result<(), PathError> {
        let cursor = self.cursor;
        let next = match cursor {
            Cursor::Open => Cursor::Open,
            Cursor::Value(ValueType::List(inner)) => Cursor::for_value(inner),
            _ => {
                return Err(PathError::UnexpectedSegment {
                    segment: segment.to_string(),
                    reason: "only list and open properties accept an index".into(),
                });
            }
        };
        let parent = self.parent();
        self.elements.push(PathElement::ArrayIndex { index, parent });
        self.cursor = next;
        Ok(())
    }
}

/// Parses the resource part of a request URL, e.g.
/// `/Datastreams(5)/Observations(11)/result`, against `registry`.
pub fn parse_path(
    registry: &ModelRegistry,
    service_root_url: &str,
    version: Version,
    raw_path: &str,
) -> Result<ResourcePath, PathError> {
    if raw_path.is_empty() || raw_path == "/" {
        return Err(PathError::Empty);
    }
    let raw_segments = match all_consuming(segments)(raw_path) {
        Ok((_, raw_segments)) => raw_segments,
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            return Err(PathError::Syntax {
                path: raw_path.to_string(),
                message: convert_error(raw_path, err),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(PathError::Syntax {
                path: raw_path.to_string(),
                message: "unexpected end of path".into(),
            });
        }
    };

    let mut resolver = Resolver {
        registry,
        elements: Vec::with_capacity(raw_segments.len() * 2),
        cursor: Cursor::Start,
    };
    let mut is_ref = false;
    let mut is_value = false;
    let last = raw_segments.len() - 1;

    for (position, segment) in raw_segments.iter().enumerate() {
        if segment.name == REF || segment.name == VALUE {
            check_suffix(&resolver, segment, position == last)?;
            is_ref = segment.name == REF;
            is_value = segment.name == VALUE;
            continue;
        }
        resolver.step(segment)?;
    }

    let root_type = match resolver.elements.first() {
        Some(PathElement::EntitySet { entity_type, .. }) => *entity_type,
        _ => return Err(PathError::Empty),
    };
    let mut path = ResourcePath::new(resolver.elements, root_type, service_root_url, version, raw_path);
    path.is_ref = is_ref;
    path.is_value = is_value;
    log::trace!(
        "resolved path {raw_path} to {} elements, main element {}",
        path.elements.len(),
        path.main
    );
    Ok(path)
}

fn check_suffix(
    resolver: &Resolver<'_>,
    segment: &RawSegment<'_>,
    is_last: bool,
) -> Result<(), PathError> {
    let misplaced = |reason: &str| PathError::MisplacedSuffix {
        suffix: segment.name.to_string(),
        reason: reason.to_string(),
    };
    if !is_last {
        return Err(misplaced("it must be the final segment"));
    }
    if segment.key.is_some() || !segment.indices.is_empty() {
        return Err(misplaced("it takes no key or index"));
    }
    let Some(previous) = resolver.elements.last() else {
        return Err(misplaced("it needs a preceding resource"));
    };
    let addresses_entity = matches!(
        previous,
        PathElement::EntitySet { .. } | PathElement::Entity { .. }
    );
    match (segment.name, addresses_entity) {
        (REF, false) => Err(misplaced("it only applies to entities and entity sets")),
        (VALUE, true) => Err(misplaced("it only applies to properties")),
        _ => Ok(()),
    }
}
