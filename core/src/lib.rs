//! Resource path and query language engine for a SensorThings-style API.
//!
//! A [`model::ModelRegistry`] is built once at start-up and then shared
//! read-only. Every request runs [`path::parse_path`], [`query::parse_query`]
//! and [`query::Query::validate`] against it, or all three at once through
//! [`parse_request`].

pub mod model;
pub mod path;
pub mod query;
pub mod request;

pub use model::{
    EntityType, EntityTypeId, Id, IdKind, ModelBuilder, ModelError, ModelPlugin, ModelRegistry,
};
pub use path::{PathElement, PathError, ResourcePath, Version, parse_path};
pub use query::{
    Expression, ExpressionError, ParseContext, ParserSettings, Query, QueryDefaults, QueryError,
    ValidationError, parse_filter, parse_order_by, parse_query,
};
pub use request::{Request, RequestError, parse_request, parse_url};
