use common::Value;

use super::settings::QueryDefaults;

/// One step of a [`PropertyPath`]. Names are classified against the model at
/// parse time, but checked against a concrete entity type only on
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Navigation(String),
    Property(String),
    /// The `@iot.id` alias for the primary key.
    PrimaryKey,
    Custom(String),
    Index(usize),
    /// A custom property holding a link to an entity of type `target`,
    /// written `name.Target`.
    CustomLink { name: String, target: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PropertyPath {
    pub segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn navigation(name: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::Navigation(name.into())])
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::Property(name.into())])
    }

    pub fn primary_key() -> Self {
        Self::new(vec![PathSegment::PrimaryKey])
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits after every navigation or custom link, so `A/B/name` becomes
    /// `[A, B, name]`.
    pub(crate) fn split_hops(self) -> Vec<PropertyPath> {
        let mut hops = Vec::new();
        let mut current = Vec::new();
        for segment in self.segments {
            let hop = matches!(
                segment,
                PathSegment::Navigation(_) | PathSegment::CustomLink { .. }
            );
            current.push(segment);
            if hop {
                hops.push(PropertyPath::new(std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            hops.push(PropertyPath::new(current));
        }
        hops
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equal => "eq",
            BinaryOperator::NotEqual => "ne",
            BinaryOperator::GreaterThan => "gt",
            BinaryOperator::GreaterEqual => "ge",
            BinaryOperator::LessThan => "lt",
            BinaryOperator::LessEqual => "le",
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "sub",
            BinaryOperator::Multiply => "mul",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual => 3,
            BinaryOperator::Add | BinaryOperator::Subtract => 4,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 5,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        self.precedence() >= 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Value),
    Path(PropertyPath),
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    Function(FunctionCall),
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall {
            name: name.into(),
            arguments,
        })
    }

    /// Visits every property path in the tree, left to right.
    pub fn paths(&self) -> Vec<&PropertyPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a PropertyPath>) {
        match self {
            Expression::Constant(_) => {}
            Expression::Path(path) => out.push(path),
            Expression::Binary { left, right, .. } => {
                left.collect_paths(out);
                right.collect_paths(out);
            }
            Expression::Unary { operand, .. } => operand.collect_paths(out),
            Expression::Function(call) => {
                for argument in &call.arguments {
                    argument.collect_paths(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expression: Expression,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(expression: Expression, direction: SortDirection) -> Self {
        Self {
            expression,
            direction,
        }
    }
}

/// The `$select` targets. Compared as a set: order and repeats are ignored.
#[derive(Debug, Clone, Default)]
pub struct Select {
    paths: Vec<PropertyPath>,
    pub distinct: bool,
}

impl Select {
    pub fn insert(&mut self, path: PropertyPath) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn paths(&self) -> &[PropertyPath] {
        &self.paths
    }

    pub fn contains(&self, path: &PropertyPath) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

impl PartialEq for Select {
    fn eq(&self, other: &Self) -> bool {
        self.distinct == other.distinct
            && self.paths.len() == other.paths.len()
            && self.paths.iter().all(|path| other.contains(path))
    }
}

impl FromIterator<PropertyPath> for Select {
    fn from_iter<I: IntoIterator<Item = PropertyPath>>(iter: I) -> Self {
        let mut select = Select::default();
        for path in iter {
            select.insert(path);
        }
        select
    }
}

/// An inline expansion of one navigation step, with its own options.
#[derive(Debug, Clone, PartialEq)]
pub struct Expand {
    pub path: PropertyPath,
    pub query: Option<Box<Query>>,
}

impl Expand {
    pub fn new(path: PropertyPath) -> Self {
        Self { path, query: None }
    }

    pub fn with_query(path: PropertyPath, query: Query) -> Self {
        Self {
            path,
            query: Some(Box::new(query)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub count: Option<bool>,
    pub result_format: Option<String>,
    pub filter: Option<Expression>,
    pub order_by: Vec<OrderBy>,
    pub select: Select,
    pub expand: Vec<Expand>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no option was given at all.
    pub fn is_empty(&self) -> bool {
        self == &Query::default()
    }

    /// `$top` bounded by the service limits.
    pub fn effective_top(&self, defaults: &QueryDefaults) -> u64 {
        self.top
            .unwrap_or(defaults.top_default)
            .min(defaults.top_max)
    }

    pub fn effective_count(&self, defaults: &QueryDefaults) -> bool {
        self.count.unwrap_or(defaults.count_default)
    }
}
