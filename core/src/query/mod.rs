//! Query options: expressions, the option grammar and validation.

pub mod ast;
mod display;
pub mod expression;
pub mod parser;
pub mod settings;
pub mod validate;

pub use ast::*;
pub use common::value::Value;
pub use expression::{ExpressionError, parse_filter, parse_order_by, parse_property_path};
pub use parser::{QueryError, parse_query};
pub use settings::{ParseContext, ParserSettings, QueryDefaults};
pub use validate::ValidationError;
