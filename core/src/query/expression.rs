//! The `$filter` / `$orderby` expression grammar.
//!
//! Operators, lowest binding first: `or`, `and`, comparisons, `add`/`sub`,
//! `mul`/`div`/`mod`, then the unary `not` and `-`. Every binary level is
//! left-associative. Semantic failures (unknown names, arity, literal
//! values) are stashed next to the grammar and reported instead of the
//! generic syntax message.

use std::cell::RefCell;

use common::temporal::{self, LiteralError, failure};
use common::{Value, ValueKind};
use function_api::FunctionError;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_while1};
use nom::character::complete::{char, digit1, multispace0, multispace1, none_of, one_of, satisfy};
use nom::combinator::{all_consuming, map, map_res, not, opt, recognize, value, verify};
use nom::error::{VerboseError, VerboseErrorKind, convert_error};
use nom::multi::{fold_many0, many0, separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use thiserror::Error;

use super::ast::{
    BinaryOperator, Expression, OrderBy, PathSegment, PropertyPath, SortDirection, UnaryOperator,
};
use super::settings::ParseContext;
use crate::model::ModelRegistry;

type IResult<'a, O> = nom::IResult<&'a str, O, VerboseError<&'a str>>;

const IOT_ID: &str = "@iot.id";

const WKT_KEYWORDS: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

const OR: &[BinaryOperator] = &[BinaryOperator::Or];
const AND: &[BinaryOperator] = &[BinaryOperator::And];
const COMPARISON: &[BinaryOperator] = &[
    BinaryOperator::Equal,
    BinaryOperator::NotEqual,
    BinaryOperator::GreaterEqual,
    BinaryOperator::GreaterThan,
    BinaryOperator::LessEqual,
    BinaryOperator::LessThan,
];
const ADDITIVE: &[BinaryOperator] = &[BinaryOperator::Add, BinaryOperator::Subtract];
const MULTIPLICATIVE: &[BinaryOperator] = &[
    BinaryOperator::Multiply,
    BinaryOperator::Divide,
    BinaryOperator::Modulo,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("{0}")]
    Function(#[from] FunctionError),
    #[error("unknown property {0}")]
    UnknownProperty(String),
    #[error("invalid path segment {segment}: {reason}")]
    InvalidPath {
        segment: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error("invalid geometry literal '{0}'")]
    Geometry(String),
    #[error("operator {operator} does not accept the constant {operand}")]
    InvalidOperand {
        operator: &'static str,
        operand: String,
    },
}

/// One `/`-separated step of a property path before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawStep<'a> {
    Name(&'a str),
    Index(usize),
}

#[derive(Clone, Copy)]
enum Position {
    Entity,
    Value,
    Key,
}

/// Classifies raw steps by the names the model declares anywhere. Whether a
/// name fits a particular entity type is left to validation.
fn classify(
    registry: &ModelRegistry,
    custom_links: bool,
    steps: &[RawStep<'_>],
) -> Result<PropertyPath, ExpressionError> {
    let mut position = Position::Entity;
    let mut segments = Vec::with_capacity(steps.len());
    for step in steps {
        let segment = match (position, *step) {
            (Position::Entity, RawStep::Name(IOT_ID)) => {
                position = Position::Key;
                PathSegment::PrimaryKey
            }
            (Position::Entity, RawStep::Name(name)) if registry.is_navigation_name(name) => {
                PathSegment::Navigation(name.to_string())
            }
            (Position::Entity, RawStep::Name(name)) if registry.is_entity_property_name(name) => {
                position = Position::Value;
                PathSegment::Property(name.to_string())
            }
            (Position::Entity, RawStep::Name(name)) => {
                return Err(ExpressionError::UnknownProperty(name.to_string()));
            }
            (Position::Entity, RawStep::Index(index)) => {
                return Err(ExpressionError::InvalidPath {
                    segment: index.to_string(),
                    reason: "an index must follow a property",
                });
            }
            (Position::Key, step) => {
                let segment = match step {
                    RawStep::Name(name) => name.to_string(),
                    RawStep::Index(index) => index.to_string(),
                };
                return Err(ExpressionError::InvalidPath {
                    segment,
                    reason: "the primary key has no sub-properties",
                });
            }
            (Position::Value, RawStep::Index(index)) => PathSegment::Index(index),
            (Position::Value, RawStep::Name(name)) => match custom_link(registry, custom_links, name)
            {
                Some((link, target)) => {
                    position = Position::Entity;
                    PathSegment::CustomLink {
                        name: link.to_string(),
                        target: target.to_string(),
                    }
                }
                None => PathSegment::Custom(name.to_string()),
            },
        };
        segments.push(segment);
    }
    Ok(PropertyPath::new(segments))
}

fn custom_link<'a>(
    registry: &ModelRegistry,
    enabled: bool,
    name: &'a str,
) -> Option<(&'a str, &'a str)> {
    if !enabled {
        return None;
    }
    let (link, target) = name.rsplit_once('.')?;
    if link.is_empty() || registry.entity_type_by_name(target).is_none() {
        return None;
    }
    Some((link, target))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn keyword<'i>(word: &'static str) -> impl FnMut(&'i str) -> IResult<'i, &'i str> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn operator<'i>(
    operators: &'static [BinaryOperator],
) -> impl Fn(&'i str) -> IResult<'i, BinaryOperator> {
    move |input| {
        let (rest, _) = multispace1(input)?;
        for op in operators {
            if let Ok((rest, _)) = terminated(keyword(op.keyword()), multispace0)(rest) {
                return Ok((rest, *op));
            }
        }
        Err(failure(input, "operator"))
    }
}

fn name_text(input: &str) -> IResult<&str> {
    alt((tag(IOT_ID), take_while1(is_name_char)))(input)
}

fn index(input: &str) -> IResult<usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

fn indices(input: &str) -> IResult<Vec<usize>> {
    many0(delimited(char('['), index, char(']')))(input)
}

fn raw_step(text: &str) -> RawStep<'_> {
    match text.parse::<usize>() {
        Ok(index) if text.bytes().all(|b| b.is_ascii_digit()) => RawStep::Index(index),
        _ => RawStep::Name(text),
    }
}

fn raw_path(input: &str) -> IResult<Vec<RawStep<'_>>> {
    let first = verify(name_text, |text: &str| {
        text.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '@')
    });
    let (rest, (head, head_indices)) = pair(first, indices)(input)?;
    let (rest, tail) = many0(preceded(char('/'), pair(name_text, indices)))(rest)?;

    let mut steps = Vec::new();
    for (text, trailing) in std::iter::once((head, head_indices)).chain(tail) {
        steps.push(raw_step(text));
        steps.extend(trailing.into_iter().map(RawStep::Index));
    }
    Ok((rest, steps))
}

/// `'...'` with `''` standing for one quote.
fn string_literal(input: &str) -> IResult<String> {
    delimited(
        char('\''),
        fold_many0(
            alt((value('\'', tag("''")), none_of("'"))),
            String::new,
            |mut text, c| {
                text.push(c);
                text
            },
        ),
        char('\''),
    )(input)
}

fn number_literal(input: &str) -> IResult<Value> {
    let (rest, raw) = terminated(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        not(satisfy(is_name_char)),
    )(input)?;
    let is_integer = !raw.contains(['.', 'e', 'E']);
    if is_integer {
        if let Ok(number) = raw.parse::<i64>() {
            return Ok((rest, Value::Integer(number)));
        }
    }
    match raw.parse::<f64>() {
        Ok(number) => Ok((rest, Value::Double(number))),
        Err(_) => Err(failure(input, "invalid number")),
    }
}

fn keyword_literal(input: &str) -> IResult<Value> {
    alt((
        value(Value::Null, keyword("null")),
        value(Value::Boolean(true), keyword("true")),
        value(Value::Boolean(false), keyword("false")),
    ))(input)
}

fn literal_text(input: &str) -> &str {
    take_till::<_, _, VerboseError<&str>>(|c: char| c.is_whitespace() || c == ')' || c == ',')(
        input,
    )
    .map(|(_, text)| text)
    .unwrap_or(input)
}

struct Grammar<'c> {
    ctx: ParseContext<'c>,
    custom_links: bool,
    error: RefCell<Option<ExpressionError>>,
}

impl<'c> Grammar<'c> {
    fn new(ctx: &ParseContext<'c>) -> Self {
        Self {
            ctx: *ctx,
            custom_links: ctx.settings.custom_links_enabled,
            error: RefCell::new(None),
        }
    }

    /// Records `error` and aborts the parse; the first recorded error wins.
    fn fail<'i>(&self, input: &'i str, error: ExpressionError) -> nom::Err<VerboseError<&'i str>> {
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(error);
        }
        nom::Err::Failure(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("invalid expression"))],
        })
    }

    fn run<'i, O>(
        &self,
        text: &'i str,
        parser: impl FnMut(&'i str) -> IResult<'i, O>,
    ) -> Result<O, ExpressionError> {
        match all_consuming(delimited(multispace0, parser, multispace0))(text) {
            Ok((_, out)) => Ok(out),
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(self
                .error
                .take()
                .unwrap_or_else(|| ExpressionError::Syntax(convert_error(text, err)))),
            Err(nom::Err::Incomplete(_)) => {
                Err(ExpressionError::Syntax("unexpected end of input".into()))
            }
        }
    }

    fn expression<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        self.left_assoc(input, OR, Self::and_expr)
    }

    fn and_expr<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        self.left_assoc(input, AND, Self::comparison)
    }

    fn comparison<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        self.left_assoc(input, COMPARISON, Self::additive)
    }

    fn additive<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        self.left_assoc(input, ADDITIVE, Self::multiplicative)
    }

    fn multiplicative<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        self.left_assoc(input, MULTIPLICATIVE, Self::unary)
    }

    fn left_assoc<'i>(
        &self,
        input: &'i str,
        operators: &'static [BinaryOperator],
        operand: fn(&Self, &'i str) -> IResult<'i, Expression>,
    ) -> IResult<'i, Expression> {
        let (mut input, mut left) = operand(self, input)?;
        loop {
            let (rest, op) = match operator(operators)(input) {
                Ok(found) => found,
                Err(nom::Err::Error(_)) => return Ok((input, left)),
                Err(err) => return Err(err),
            };
            let (rest, right) = operand(self, rest)?;
            self.check_operand(input, op, &left)?;
            self.check_operand(input, op, &right)?;
            left = Expression::binary(op, left, right);
            input = rest;
        }
    }

    fn check_operand<'i>(
        &self,
        input: &'i str,
        op: BinaryOperator,
        operand: &Expression,
    ) -> Result<(), nom::Err<VerboseError<&'i str>>> {
        let Expression::Constant(constant) = operand else {
            return Ok(());
        };
        let admitted = match (op, constant.kind()) {
            (_, ValueKind::Null) => true,
            (BinaryOperator::And | BinaryOperator::Or, kind) => kind == ValueKind::Boolean,
            (op, kind) if op.is_arithmetic() => {
                matches!(kind, ValueKind::Numeric | ValueKind::Temporal)
            }
            _ => true,
        };
        if admitted {
            Ok(())
        } else {
            Err(self.fail(
                input,
                ExpressionError::InvalidOperand {
                    operator: op.keyword(),
                    operand: constant.to_string(),
                },
            ))
        }
    }

    fn unary<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        if let Ok((rest, _)) = terminated(keyword("not"), multispace0)(input) {
            let (rest, operand) = self.unary(rest)?;
            if let Expression::Constant(constant) = &operand {
                if !matches!(constant.kind(), ValueKind::Boolean | ValueKind::Null) {
                    return Err(self.fail(
                        input,
                        ExpressionError::InvalidOperand {
                            operator: "not",
                            operand: constant.to_string(),
                        },
                    ));
                }
            }
            return Ok((rest, Expression::unary(UnaryOperator::Not, operand)));
        }
        match self.primary(input) {
            Err(nom::Err::Error(_)) => {}
            other => return other,
        }
        let (rest, _) = pair(char('-'), multispace0)(input)?;
        let (rest, operand) = self.unary(rest)?;
        Ok((rest, Expression::unary(UnaryOperator::Negate, operand)))
    }

    fn primary<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        alt((
            delimited(
                pair(char('('), multispace0),
                |i| self.expression(i),
                pair(multispace0, char(')')),
            ),
            map(|i| self.literal(i), Expression::Constant),
            |i| self.function_call(i),
            map(|i| self.property_path(i), Expression::Path),
        ))(input)
    }

    fn literal<'i>(&self, input: &'i str) -> IResult<'i, Value> {
        alt((
            keyword_literal,
            |i| self.duration_literal(i),
            |i| self.geometry_literal(i),
            |i| self.temporal_literal(i),
            |i| self.number_literal(i),
            map(string_literal, Value::String),
        ))(input)
    }

    /// Doubles that overflow to infinity have no literal form and are rejected.
    fn number_literal<'i>(&self, input: &'i str) -> IResult<'i, Value> {
        let (rest, value) = number_literal(input)?;
        match value {
            Value::Double(number) if !number.is_finite() => Err(self.fail(
                input,
                LiteralError::Number(input[..input.len() - rest.len()].to_string()).into(),
            )),
            value => Ok((rest, value)),
        }
    }

    fn duration_literal<'i>(&self, input: &'i str) -> IResult<'i, Value> {
        let (rest, _) = tag("duration'")(input)?;
        match terminated(temporal::duration, char('\''))(rest) {
            Ok((rest, duration)) => Ok((rest, Value::Duration(duration))),
            Err(_) => Err(self.fail(
                input,
                LiteralError::Duration(literal_text(rest).trim_end_matches('\'').to_string())
                    .into(),
            )),
        }
    }

    fn geometry_literal<'i>(&self, input: &'i str) -> IResult<'i, Value> {
        let (rest, _) = alt((tag("geography"), tag("geometry")))(input)?;
        let (rest, wkt) = string_literal(rest)?;
        let upper = wkt.trim_start().to_ascii_uppercase();
        let known = WKT_KEYWORDS.iter().any(|keyword| {
            upper
                .strip_prefix(keyword)
                .is_some_and(|tail| tail.trim_start().starts_with(['(', 'E']))
        });
        if known {
            Ok((rest, Value::Geometry(wkt)))
        } else {
            Err(self.fail(input, ExpressionError::Geometry(wkt)))
        }
    }

    fn temporal_literal<'i>(&self, input: &'i str) -> IResult<'i, Value> {
        match temporal::interval(input) {
            Ok((rest, interval)) => return Ok((rest, Value::Interval(interval))),
            Err(nom::Err::Failure(err)) => {
                let reason = err
                    .errors
                    .iter()
                    .find_map(|(_, kind)| match kind {
                        VerboseErrorKind::Context(reason) => Some(*reason),
                        _ => None,
                    })
                    .unwrap_or("malformed interval");
                return Err(self.fail(
                    input,
                    LiteralError::Interval {
                        literal: literal_text(input).to_string(),
                        reason,
                    }
                    .into(),
                ));
            }
            Err(_) => {}
        }
        alt((
            map(temporal::date_time, Value::DateTime),
            terminated(map(temporal::date, Value::Date), not(char('T'))),
            map(temporal::time_of_day, Value::Time),
        ))(input)
    }

    fn function_call<'i>(&self, input: &'i str) -> IResult<'i, Expression> {
        let function_name = verify(take_while1(is_name_char), |name: &str| {
            name.starts_with(char::is_alphabetic)
        });
        let (rest, name) = terminated(function_name, char('('))(input)?;
        let (rest, arguments) = terminated(
            delimited(
                multispace0,
                separated_list0(tuple((multispace0, char(','), multispace0)), |i| {
                    self.expression(i)
                }),
                multispace0,
            ),
            char(')'),
        )(rest)?;

        let spec = match self.ctx.functions.resolve(name, arguments.len()) {
            Ok(spec) => spec,
            Err(FunctionError::NotFound(_)) => {
                return Err(self.fail(input, ExpressionError::UnknownFunction(name.to_string())));
            }
            Err(err) => return Err(self.fail(input, err.into())),
        };
        for (position, argument) in arguments.iter().enumerate() {
            let expected = spec.parameter(position);
            let found = match argument {
                Expression::Constant(constant) if !expected.admits(constant.kind()) => {
                    constant.to_string()
                }
                Expression::Function(call) => match self.ctx.functions.get(&call.name) {
                    Some(inner) if !expected.compatible(inner.returns) => {
                        format!("{}() returning {}", call.name, inner.returns)
                    }
                    _ => continue,
                },
                _ => continue,
            };
            let error = FunctionError::InvalidArgument {
                function: spec.name.clone(),
                position,
                expected,
                found,
            };
            return Err(self.fail(input, error.into()));
        }
        Ok((rest, Expression::function(spec.name.clone(), arguments)))
    }

    fn property_path<'i>(&self, input: &'i str) -> IResult<'i, PropertyPath> {
        let (rest, steps) = raw_path(input)?;
        match classify(self.ctx.registry, self.custom_links, &steps) {
            Ok(path) => Ok((rest, path)),
            Err(err) => Err(self.fail(input, err)),
        }
    }

    fn order_by_item<'i>(&self, input: &'i str) -> IResult<'i, OrderBy> {
        let direction = alt((
            value(SortDirection::Ascending, keyword("asc")),
            value(SortDirection::Descending, keyword("desc")),
        ));
        let (rest, expression) = self.expression(input)?;
        let (rest, direction) = opt(preceded(multispace1, direction))(rest)?;
        Ok((
            rest,
            OrderBy::new(expression, direction.unwrap_or_default()),
        ))
    }
}

/// Parses a `$filter` value into an expression tree.
pub fn parse_filter(text: &str, ctx: &ParseContext<'_>) -> Result<Expression, ExpressionError> {
    let grammar = Grammar::new(ctx);
    let expression = grammar.run(text, |i| grammar.expression(i))?;
    log::trace!("parsed filter {text:?}");
    Ok(expression)
}

/// Parses a `$orderby` value: comma-separated expressions, each optionally
/// followed by `asc` or `desc`.
pub fn parse_order_by(text: &str, ctx: &ParseContext<'_>) -> Result<Vec<OrderBy>, ExpressionError> {
    let grammar = Grammar::new(ctx);
    grammar.run(
        text,
        separated_list1(tuple((multispace0, char(','), multispace0)), |i| {
            grammar.order_by_item(i)
        }),
    )
}

/// Parses a single `/`-separated property path as used by `$select` and
/// `$expand`.
pub fn parse_property_path(
    text: &str,
    ctx: &ParseContext<'_>,
) -> Result<PropertyPath, ExpressionError> {
    let grammar = Grammar::new(ctx);
    grammar.run(text, |i| grammar.property_path(i))
}
