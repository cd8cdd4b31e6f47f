//! Entity identifiers and the managers that read them from key text.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// A resolved primary-key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    Long(i64),
    String(String),
    Uuid(Uuid),
}

impl fmt::Display for Id {
    /// Renders the key the way it appears between parentheses in a path.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Long(value) => write!(f, "{value}"),
            Id::String(value) => f.write_str(&common::value::quote(value)),
            Id::Uuid(value) => write!(f, "'{value}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdKind {
    #[default]
    Long,
    String,
    Uuid,
}

impl IdKind {
    pub fn manager(self) -> &'static dyn IdManager {
        match self {
            IdKind::Long => &LongIdManager,
            IdKind::String => &StringIdManager,
            IdKind::Uuid => &UuidIdManager,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("'{0}' is not an integer key")]
    NotAnInteger(String),
    #[error("integer key '{0}' is out of range")]
    OutOfRange(String),
    #[error("'{0}' is not a quoted string key")]
    NotQuoted(String),
    #[error("'{0}' is not a valid UUID key")]
    InvalidUuid(String),
}

/// Converts the text between a segment's parentheses into an [`Id`].
pub trait IdManager: Send + Sync {
    fn kind(&self) -> IdKind;

    fn parse_id(&self, raw: &str) -> Result<Id, IdError>;
}

pub struct LongIdManager;

impl IdManager for LongIdManager {
    fn kind(&self) -> IdKind {
        IdKind::Long
    }

    fn parse_id(&self, raw: &str) -> Result<Id, IdError> {
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NotAnInteger(raw.to_string()));
        }
        raw.parse::<i64>()
            .map(Id::Long)
            .map_err(|_| IdError::OutOfRange(raw.to_string()))
    }
}

pub struct StringIdManager;

impl IdManager for StringIdManager {
    fn kind(&self) -> IdKind {
        IdKind::String
    }

    fn parse_id(&self, raw: &str) -> Result<Id, IdError> {
        unquote(raw)
            .map(Id::String)
            .ok_or_else(|| IdError::NotQuoted(raw.to_string()))
    }
}

pub struct UuidIdManager;

impl IdManager for UuidIdManager {
    fn kind(&self) -> IdKind {
        IdKind::Uuid
    }

    fn parse_id(&self, raw: &str) -> Result<Id, IdError> {
        let text = unquote(raw).ok_or_else(|| IdError::NotQuoted(raw.to_string()))?;
        Uuid::parse_str(&text)
            .map(Id::Uuid)
            .map_err(|_| IdError::InvalidUuid(raw.to_string()))
    }
}

/// Strips the surrounding single quotes and folds every `''` into `'`.
/// A lone quote inside the body makes the key invalid.
pub(crate) fn unquote(raw: &str) -> Option<String> {
    let body = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next() != Some('\'') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}
