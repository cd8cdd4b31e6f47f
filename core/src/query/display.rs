//! Canonical text forms. Output is not percent-encoded; parsing it again
//! yields an equal tree.

use std::fmt::{self, Display, Formatter};

use super::ast::{
    BinaryOperator, Expand, Expression, OrderBy, PathSegment, PropertyPath, Query, SortDirection,
    UnaryOperator,
};

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Navigation(name)
            | PathSegment::Property(name)
            | PathSegment::Custom(name) => f.write_str(name),
            PathSegment::PrimaryKey => f.write_str("@iot.id"),
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::CustomLink { name, target } => write!(f, "{name}.{target}"),
        }
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                _ if position == 0 => write!(f, "{segment}")?,
                _ => write!(f, "/{segment}")?,
            }
        }
        Ok(())
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

fn is_atom(expression: &Expression) -> bool {
    matches!(expression, Expression::Path(_) | Expression::Function(_))
}

fn write_operand(
    f: &mut Formatter<'_>,
    operand: &Expression,
    parent: BinaryOperator,
    right_side: bool,
) -> fmt::Result {
    let needs_parens = match operand {
        Expression::Binary { op, .. } => {
            op.precedence() < parent.precedence()
                || (right_side && op.precedence() == parent.precedence())
        }
        _ => false,
    };
    if needs_parens {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Path(path) => write!(f, "{path}"),
            Expression::Binary { op, left, right } => {
                write_operand(f, left, *op, false)?;
                write!(f, " {op} ")?;
                write_operand(f, right, *op, true)
            }
            Expression::Unary { op, operand } => {
                let keyword = match op {
                    UnaryOperator::Not => "not ",
                    UnaryOperator::Negate => "-",
                };
                let bare = is_atom(operand)
                    || (*op == UnaryOperator::Not && matches!(**operand, Expression::Constant(_)));
                if bare {
                    write!(f, "{keyword}{operand}")
                } else {
                    write!(f, "{keyword}({operand})")
                }
            }
            Expression::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (position, argument) in call.arguments.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.expression),
            SortDirection::Descending => write!(f, "{} desc", self.expression),
        }
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl Query {
    fn options(&self) -> Vec<String> {
        let mut options = Vec::new();
        if !self.select.is_empty() {
            let prefix = if self.select.distinct { "distinct:" } else { "" };
            options.push(format!("$select={prefix}{}", join(self.select.paths(), ",")));
        }
        if !self.expand.is_empty() {
            options.push(format!("$expand={}", join(&self.expand, ",")));
        }
        if let Some(filter) = &self.filter {
            options.push(format!("$filter={filter}"));
        }
        if !self.order_by.is_empty() {
            options.push(format!("$orderby={}", join(&self.order_by, ",")));
        }
        if let Some(top) = self.top {
            options.push(format!("$top={top}"));
        }
        if let Some(skip) = self.skip {
            options.push(format!("$skip={skip}"));
        }
        if let Some(count) = self.count {
            options.push(format!("$count={count}"));
        }
        if let Some(format) = &self.result_format {
            options.push(format!("$resultFormat={format}"));
        }
        options
    }
}

impl Display for Expand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        match &self.query {
            Some(query) if !query.is_empty() => write!(f, "({})", query.options().join(";")),
            _ => Ok(()),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.options().join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_render_indices_in_brackets() {
        let path = PropertyPath::new(vec![
            PathSegment::Property("properties".into()),
            PathSegment::Custom("a".into()),
            PathSegment::Index(2),
            PathSegment::Index(3),
            PathSegment::CustomLink {
                name: "home".into(),
                target: "House".into(),
            },
        ]);
        assert_eq!(path.to_string(), "properties/a[2][3]/home.House");
    }

    #[test]
    fn parentheses_follow_precedence() {
        use BinaryOperator::*;
        let sum = Expression::binary(
            Add,
            Expression::Path(PropertyPath::property("a")),
            Expression::constant(1),
        );
        let product = Expression::binary(Multiply, sum.clone(), Expression::constant(2));
        assert_eq!(product.to_string(), "(a add 1) mul 2");

        let right_nested = Expression::binary(
            Subtract,
            Expression::constant(5),
            sum.clone(),
        );
        assert_eq!(right_nested.to_string(), "5 sub (a add 1)");

        let left_nested = Expression::binary(Subtract, sum, Expression::constant(5));
        assert_eq!(left_nested.to_string(), "a add 1 sub 5");
    }

    #[test]
    fn nested_expands_use_semicolons() {
        let inner = Query {
            top: Some(2),
            expand: vec![Expand::new(PropertyPath::navigation("B"))],
            ..Query::default()
        };
        let query = Query {
            count: Some(true),
            expand: vec![Expand::with_query(PropertyPath::navigation("A"), inner)],
            ..Query::default()
        };
        assert_eq!(query.to_string(), "$expand=A($expand=B;$top=2)&$count=true");
    }
}
