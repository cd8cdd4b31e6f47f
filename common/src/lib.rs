//! Literal values shared by the path, expression and query layers.

pub mod temporal;
pub mod value;

pub use temporal::{Interval, IsoDuration, LiteralError, TimeBound};
pub use value::{Value, ValueKind};
