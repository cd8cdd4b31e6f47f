use std::collections::HashSet;

use thiserror::Error;

use super::ast::{Expand, PropertyPath, Query, Select};
use super::expression::{ExpressionError, parse_filter, parse_order_by, parse_property_path};
use super::settings::ParseContext;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown query option {0}")]
    UnknownOption(String),
    #[error("query option {0} is given more than once")]
    DuplicateOption(String),
    #[error("invalid value for {option}: {reason}")]
    InvalidValue { option: String, reason: String },
    #[error("in {option}: {source}")]
    Expression {
        option: String,
        #[source]
        source: ExpressionError,
    },
    #[error("unbalanced parentheses in '{0}'")]
    UnbalancedParentheses(String),
    #[error("'{0}' is not valid percent-encoded UTF-8")]
    Decode(String),
}

/// Where an option list sits: the request's query string, or the
/// parentheses of an `$expand` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Root,
    Nested,
}

impl Scope {
    fn separator(self) -> char {
        match self {
            Scope::Root => '&',
            Scope::Nested => ';',
        }
    }
}

/// The items of an option list. Root items are split on every `&` while the
/// text is still encoded, so quotes and parentheses are only counted once
/// decoded; nested items come from decoded text and are split outside
/// quotes and parentheses.
fn split_options(text: &str, scope: Scope) -> Result<Vec<&str>, QueryError> {
    match scope {
        Scope::Root => Ok(text.split(scope.separator()).collect()),
        Scope::Nested => split_top_level(text, scope.separator()),
    }
}

/// Splits `text` on `separator` outside quotes and parentheses.
fn split_top_level(text: &str, separator: char) -> Result<Vec<&str>, QueryError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| QueryError::UnbalancedParentheses(text.to_string()))?;
            }
            c if c == separator && !quoted && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(QueryError::UnbalancedParentheses(text.to_string()));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn decode(raw: &str, scope: Scope) -> Result<String, QueryError> {
    match scope {
        Scope::Root => urlencoding::decode(&raw.replace('+', " "))
            .map(|text| text.into_owned())
            .map_err(|_| QueryError::Decode(raw.to_string())),
        Scope::Nested => Ok(raw.to_string()),
    }
}

fn invalid(option: &str, reason: impl Into<String>) -> QueryError {
    QueryError::InvalidValue {
        option: option.to_string(),
        reason: reason.into(),
    }
}

fn in_option(option: &str) -> impl FnOnce(ExpressionError) -> QueryError + '_ {
    move |source| QueryError::Expression {
        option: option.to_string(),
        source,
    }
}

fn non_negative(option: &str, value: &str) -> Result<u64, QueryError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(option, format!("'{value}' is not a non-negative integer")));
    }
    value
        .parse()
        .map_err(|_| invalid(option, format!("'{value}' is out of range")))
}

fn parse_options(text: &str, ctx: &ParseContext<'_>, scope: Scope) -> Result<Query, QueryError> {
    let mut query = Query::default();
    let mut seen = HashSet::new();
    for item in split_options(text, scope)? {
        if item.trim().is_empty() {
            continue;
        }
        let (raw_name, raw_value) = item
            .split_once('=')
            .ok_or_else(|| invalid(item, "expected name=value"))?;
        let name = decode(raw_name, scope)?;
        let value = decode(raw_value, scope)?;
        let name = name.trim();
        if !seen.insert(name.to_string()) {
            return Err(QueryError::DuplicateOption(name.to_string()));
        }
        apply_option(&mut query, name, value.trim(), ctx)?;
    }
    Ok(query)
}

fn apply_option(
    query: &mut Query,
    name: &str,
    value: &str,
    ctx: &ParseContext<'_>,
) -> Result<(), QueryError> {
    match name {
        "$top" => query.top = Some(non_negative(name, value)?),
        "$skip" => query.skip = Some(non_negative(name, value)?),
        "$count" => {
            query.count = Some(match value {
                "true" => true,
                "false" => false,
                other => return Err(invalid(name, format!("'{other}' is not true or false"))),
            })
        }
        "$filter" => query.filter = Some(parse_filter(value, ctx).map_err(in_option(name))?),
        "$orderby" => query.order_by = parse_order_by(value, ctx).map_err(in_option(name))?,
        "$select" => query.select = parse_select(value, ctx)?,
        "$expand" => query.expand = parse_expand(value, ctx)?,
        "$resultFormat" => {
            if value.is_empty() {
                return Err(invalid(name, "a format name is required"));
            }
            query.result_format = Some(value.to_string());
        }
        other => return Err(QueryError::UnknownOption(other.to_string())),
    }
    Ok(())
}

fn parse_select(value: &str, ctx: &ParseContext<'_>) -> Result<Select, QueryError> {
    const OPTION: &str = "$select";
    let (distinct, list) = match value.strip_prefix("distinct:") {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let mut select = Select::default();
    select.distinct = distinct;
    for item in split_top_level(list, ',')? {
        let item = item.trim();
        if item.is_empty() {
            return Err(invalid(OPTION, "empty select item"));
        }
        select.insert(parse_property_path(item, ctx).map_err(in_option(OPTION))?);
    }
    Ok(select)
}

fn parse_expand(value: &str, ctx: &ParseContext<'_>) -> Result<Vec<Expand>, QueryError> {
    const OPTION: &str = "$expand";
    let mut expands = Vec::new();
    for item in split_top_level(value, ',')? {
        let item = item.trim();
        if item.is_empty() {
            return Err(invalid(OPTION, "empty expand item"));
        }
        let (path_text, nested) = match item.find('(') {
            Some(open) => {
                let inner = item[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| QueryError::UnbalancedParentheses(item.to_string()))?;
                (item[..open].trim_end(), Some(inner))
            }
            None => (item, None),
        };
        let path = parse_property_path(path_text, ctx).map_err(in_option(OPTION))?;
        let sub_query = match nested {
            Some(inner) if !inner.trim().is_empty() => {
                Some(parse_options(inner, ctx, Scope::Nested)?)
            }
            _ => None,
        };
        expands.push(nest_expand(path, sub_query));
    }
    Ok(expands)
}

/// `A/B(opts)` becomes `A` expanding `B(opts)`.
fn nest_expand(path: PropertyPath, sub_query: Option<Query>) -> Expand {
    let mut hops = path.split_hops();
    let mut expand = Expand {
        path: hops.pop().unwrap_or_default(),
        query: sub_query.map(Box::new),
    };
    while let Some(parent) = hops.pop() {
        let query = Query {
            expand: vec![expand],
            ..Query::default()
        };
        expand = Expand::with_query(parent, query);
    }
    expand
}

/// Parses a query string such as `$filter=...&$expand=A($top=2)`.
///
/// Names and values are form-decoded (`+` is a space, then percent escapes)
/// after splitting on `&`. Inside an `$expand` item the nested options are
/// separated by `;` and follow the same grammar.
pub fn parse_query(text: &str, ctx: &ParseContext<'_>) -> Result<Query, QueryError> {
    let text = text.strip_prefix('?').unwrap_or(text);
    let query = parse_options(text, ctx, Scope::Root)?;
    log::debug!("parsed query options {text:?}");
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitting_respects_quotes_and_parentheses() {
        assert_eq!(
            split_options("$filter=name eq 'a;b';$expand=A($top=1;x)", Scope::Nested).unwrap(),
            vec!["$filter=name eq 'a;b'", "$expand=A($top=1;x)"]
        );
        assert_eq!(
            split_top_level("A,B($expand=C,D),E", ',').unwrap(),
            vec!["A", "B($expand=C,D)", "E"]
        );
    }

    #[test]
    fn root_items_split_before_decoding() {
        assert_eq!(
            split_options("$filter=name%20eq%20%27a(b%27&$top=1", Scope::Root).unwrap(),
            vec!["$filter=name%20eq%20%27a(b%27", "$top=1"]
        );
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        assert!(matches!(
            split_top_level("A($top=1", ','),
            Err(QueryError::UnbalancedParentheses(_))
        ));
        assert!(matches!(
            split_top_level("A)", ','),
            Err(QueryError::UnbalancedParentheses(_))
        ));
    }

    #[test]
    fn counts_must_be_plain_digits() {
        assert_eq!(non_negative("$top", "10"), Ok(10));
        assert!(non_negative("$top", "-1").is_err());
        assert!(non_negative("$top", "+1").is_err());
        assert!(non_negative("$top", "1e3").is_err());
        assert!(non_negative("$top", "99999999999999999999999").is_err());
    }

    #[test]
    fn only_the_root_scope_is_decoded() {
        assert_eq!(decode("a%20b", Scope::Root).unwrap(), "a b");
        assert_eq!(decode("a+b%2Bc", Scope::Root).unwrap(), "a b+c");
        assert_eq!(decode("a%20b", Scope::Nested).unwrap(), "a%20b");
        assert!(decode("%FF", Scope::Root).is_err());
    }
}
