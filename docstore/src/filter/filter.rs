use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Comparison operators usable in a leaf filter.
///
/// Each operator compares a document field, addressed by a dotted path,
/// against a scalar or list value. Which operators a backend supports is a
/// property of that backend; an unsupported operator fails filter compilation
/// with an `UnsupportedOperation` error naming the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field does not equal the value. On optional fields a missing field
    /// counts as "not equal" (NULL-safe semantics).
    Neq,
    /// Field is numerically greater than the value.
    Gt,
    /// Field is numerically greater than or equal to the value.
    Gte,
    /// Field is numerically less than the value.
    Lt,
    /// Field is numerically less than or equal to the value.
    Lte,
    /// Field matches the value as a case-insensitive substring.
    Like,
    /// Field equals one of the listed values.
    In,
    /// Field equals none of the listed values. On optional fields a missing
    /// field counts as "not in" (NULL-safe semantics).
    NotIn,
    /// Field is present in the document.
    Exists,
    /// Field is absent from the document.
    NotExists,
    /// Field (an array) contains the value.
    Contains,
}

impl Display for FilterOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "EQ"),
            FilterOp::Neq => write!(f, "NEQ"),
            FilterOp::Gt => write!(f, "GT"),
            FilterOp::Gte => write!(f, "GTE"),
            FilterOp::Lt => write!(f, "LT"),
            FilterOp::Lte => write!(f, "LTE"),
            FilterOp::Like => write!(f, "LIKE"),
            FilterOp::In => write!(f, "IN"),
            FilterOp::NotIn => write!(f, "NOT_IN"),
            FilterOp::Exists => write!(f, "EXISTS"),
            FilterOp::NotExists => write!(f, "NOT_EXISTS"),
            FilterOp::Contains => write!(f, "CONTAINS"),
        }
    }
}

/// Logical operators combining two filters in a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

/// A query filter for selecting documents from a collection.
///
/// `Filter` is a binary expression tree with an explicit operator tag per
/// node, enabling exhaustive matching in backend compilers.
///
/// # Filter Composition
///
/// Filters can be composed using logical operators:
/// - `and(other)` - Combines with another filter using logical AND
/// - `or(other)` - Combines with another filter using logical OR
///
/// Combinators produce a new immutable node; operands are never mutated.
///
/// # Empty composites
///
/// A composite node may carry absent operands. A composite with both operands
/// absent is semantically empty and compiles to "no predicate"; a composite
/// with exactly one operand behaves as that operand alone. This lets callers
/// fold an optional list of conditions into a single filter without special
/// cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A single field-operator-value comparison.
    Leaf {
        op: FilterOp,
        field: String,
        value: Value,
    },
    /// An AND/OR combination of two optional sub-filters.
    Composite {
        op: LogicalOp,
        left: Option<Box<Filter>>,
        right: Option<Box<Filter>>,
    },
}

impl Filter {
    /// Creates a leaf filter comparing a field against a value.
    ///
    /// # Arguments
    ///
    /// * `op` - The comparison operator
    /// * `field` - Dotted path of the field to compare
    /// * `value` - The value to compare against (a list for `In`/`NotIn`,
    ///   ignored for `Exists`/`NotExists`)
    pub fn leaf(op: FilterOp, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Leaf {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a composite filter from two optional operands.
    ///
    /// Either or both operands may be absent; see the type-level notes on
    /// empty composites.
    pub fn composite(op: LogicalOp, left: Option<Filter>, right: Option<Filter>) -> Self {
        Filter::Composite {
            op,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    /// Combines this filter with another using logical AND.
    ///
    /// # Returns
    ///
    /// A new `Filter` representing `self AND filter`
    pub fn and(self, filter: Filter) -> Self {
        Filter::composite(LogicalOp::And, Some(self), Some(filter))
    }

    /// Combines this filter with another using logical OR.
    ///
    /// # Returns
    ///
    /// A new `Filter` representing `self OR filter`
    pub fn or(self, filter: Filter) -> Self {
        Filter::composite(LogicalOp::Or, Some(self), Some(filter))
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Leaf { op, field, value } => write!(f, "{} {} {}", field, op, value),
            Filter::Composite { op, left, right } => {
                let render = |side: &Option<Box<Filter>>| match side {
                    Some(filter) => filter.to_string(),
                    None => "<none>".to_string(),
                };
                write!(f, "({} {} {})", render(left), op, render(right))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_construction() {
        let filter = Filter::leaf(FilterOp::Eq, "name", "Alice");
        match filter {
            Filter::Leaf { op, field, value } => {
                assert_eq!(op, FilterOp::Eq);
                assert_eq!(field, "name");
                assert_eq!(value, json!("Alice"));
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn test_and_does_not_mutate_operands() {
        let left = Filter::leaf(FilterOp::Eq, "a", 1);
        let right = Filter::leaf(FilterOp::Eq, "b", 2);
        let combined = left.clone().and(right.clone());
        match combined {
            Filter::Composite { op, left: l, right: r } => {
                assert_eq!(op, LogicalOp::And);
                assert_eq!(*l.unwrap(), left);
                assert_eq!(*r.unwrap(), right);
            }
            _ => panic!("expected a composite"),
        }
    }

    #[test]
    fn test_nested_composition() {
        let filter = Filter::leaf(FilterOp::Eq, "a", 1)
            .and(Filter::leaf(FilterOp::Eq, "b", 2))
            .or(Filter::leaf(FilterOp::Gt, "c", 3));
        match filter {
            Filter::Composite { op: LogicalOp::Or, left, .. } => {
                assert!(matches!(
                    *left.unwrap(),
                    Filter::Composite { op: LogicalOp::And, .. }
                ));
            }
            _ => panic!("expected an OR composite"),
        }
    }

    #[test]
    fn test_empty_composite() {
        let filter = Filter::composite(LogicalOp::And, None, None);
        match filter {
            Filter::Composite { left, right, .. } => {
                assert!(left.is_none());
                assert!(right.is_none());
            }
            _ => panic!("expected a composite"),
        }
    }

    #[test]
    fn test_operator_display_names() {
        assert_eq!(FilterOp::NotIn.to_string(), "NOT_IN");
        assert_eq!(FilterOp::NotExists.to_string(), "NOT_EXISTS");
        assert_eq!(FilterOp::Contains.to_string(), "CONTAINS");
        assert_eq!(LogicalOp::And.to_string(), "AND");
        assert_eq!(LogicalOp::Or.to_string(), "OR");
    }
}
