//! Resource paths: the addressing part of a request URL.

pub mod element;
pub mod parser;

use thiserror::Error;

use crate::model::IdError;

pub use element::{PathElement, ResourcePath, Version};
pub use parser::parse_path;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("the resource path is empty")]
    Empty,
    #[error("malformed resource path '{path}': {message}")]
    Syntax { path: String, message: String },
    #[error("unknown protocol version '{0}'")]
    UnknownVersion(String),
    #[error("no entity set named {0}")]
    UnknownEntitySet(String),
    #[error("{entity_type} has no property {property}")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },
    #[error("invalid key for {entity_type}: {source}")]
    InvalidKey {
        entity_type: String,
        #[source]
        source: IdError,
    },
    #[error("segment {0} does not accept a key")]
    KeyNotAllowed(String),
    #[error("unexpected segment {segment}: {reason}")]
    UnexpectedSegment { segment: String, reason: String },
    #[error("misplaced {suffix}: {reason}")]
    MisplacedSuffix { suffix: String, reason: String },
}
