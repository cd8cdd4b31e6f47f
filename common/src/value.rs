use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::temporal::{Interval, IsoDuration, format_date_time};

/// A typed literal as it appears in a filter expression or an entity key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(IsoDuration),
    Interval(Interval),
    /// Well-known-text geometry, kept verbatim.
    Geometry(String),
}

/// Coarse classification used for static argument checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Numeric,
    Text,
    Temporal,
    Geometry,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) | Value::Double(_) => ValueKind::Numeric,
            Value::String(_) => ValueKind::Text,
            Value::DateTime(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::Duration(_)
            | Value::Interval(_) => ValueKind::Temporal,
            Value::Geometry(_) => ValueKind::Geometry,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Boolean(flag)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Integer(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Integer(i64::from(number))
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Double(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

/// Quotes `text` with single quotes, doubling any embedded quote.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(flag) => write!(f, "{flag}"),
            Value::Integer(number) => write!(f, "{number}"),
            Value::Double(number) => write!(f, "{number:?}"),
            Value::String(text) => f.write_str(&quote(text)),
            Value::DateTime(instant) => f.write_str(&format_date_time(instant)),
            Value::Date(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Value::Time(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
            Value::Duration(duration) => write!(f, "duration'{duration}'"),
            Value::Interval(interval) => write!(f, "{interval}"),
            Value::Geometry(wkt) => write!(f, "geography{}", quote(wkt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::parse_duration;

    #[test]
    fn string_display_doubles_quotes() {
        let value = Value::String("it's".into());
        assert_eq!(value.to_string(), "'it''s'");
    }

    #[test]
    fn doubles_keep_a_fraction_marker() {
        assert_eq!(Value::Double(3.0).to_string(), "3.0");
        assert_eq!(Value::Integer(3).to_string(), "3");
    }

    #[test]
    fn temporal_values_share_a_kind() {
        let duration = Value::Duration(parse_duration("PT1H").unwrap());
        assert_eq!(duration.kind(), ValueKind::Temporal);
        assert_eq!(duration.to_string(), "duration'PT1H'");
        assert_eq!(Value::Integer(1).kind(), ValueKind::Numeric);
    }
}
