//! Lowers a [Filter] tree into a parameterized SQL boolean expression.
//!
//! Compilation is a pure, per-call transformation: it walks the tree
//! left-to-right, emits `?` placeholders, and appends the matching bound
//! values to a [Params] accumulator in emission order. Field names are
//! classified per [crate::field] and values never appear in the query text.
//!
//! Negation operators (`NEQ`, `NOT_IN`) on JSON fields compile to a
//! disjunction with an `IS NULL` clause on the containing JSON reference, so
//! a missing optional field counts as "not equal" / "not in". The positive
//! forms (`EQ`, `IN`) deliberately carry no such clause; downstream callers
//! depend on this three-valued-logic asymmetry.

use docstore::errors::{DocStoreError, DocStoreResult, ErrorKind};
use docstore::filter::{Filter, FilterOp};
use docstore::UNSUPPORTED_QUERY_OPERATION;
use itertools::Itertools;
use serde_json::Value;

use crate::field::{classify, container_accessor, text_accessor, FieldKind};
use crate::params::Params;

/// Compiles a filter tree into a SQL boolean expression.
///
/// # Arguments
///
/// * `filter` - The filter tree (leaf or composite)
/// * `params` - The accumulator receiving bound values in placeholder order
///
/// # Returns
///
/// `Some(expression)` to use as a WHERE predicate, or `None` if the filter is
/// semantically empty (a composite with both operands absent) and no
/// predicate should be emitted.
pub fn compile_filter(filter: &Filter, params: &mut Params) -> DocStoreResult<Option<String>> {
    match filter {
        Filter::Leaf { .. } => Ok(Some(compile_leaf(filter, params)?)),
        Filter::Composite { op, left, right } => {
            let left = compile_operand(left, params)?;
            let right = compile_operand(right, params)?;
            Ok(match (left, right) {
                // parentheses wrap each compiled sub-expression exactly, so
                // precedence is preserved at arbitrary nesting depth
                (Some(l), Some(r)) => Some(format!("({}) {} ({})", l, op, r)),
                (Some(side), None) | (None, Some(side)) => Some(side),
                (None, None) => None,
            })
        }
    }
}

fn compile_operand(
    operand: &Option<Box<Filter>>,
    params: &mut Params,
) -> DocStoreResult<Option<String>> {
    match operand {
        Some(filter) => compile_filter(filter, params),
        None => Ok(None),
    }
}

/// Compiles a single leaf comparison into a SQL expression, appending its
/// bound values to `params`.
///
/// # Returns
///
/// The compiled expression, or an `UnsupportedOperation` error naming the
/// operator if the backend cannot lower it.
pub fn compile_leaf(filter: &Filter, params: &mut Params) -> DocStoreResult<String> {
    let (op, field, value) = match filter {
        Filter::Leaf { op, field, value } => (op, field.as_str(), value),
        Filter::Composite { op, .. } => {
            log::error!("Logical operator {} is not valid in a leaf filter", op);
            return Err(DocStoreError::new(
                &format!("Logical operator {} is not valid in a leaf filter", op),
                ErrorKind::FilterError,
            ));
        }
    };

    match op {
        FilterOp::Eq => {
            params.push_value(value);
            Ok(format!("{} = ?", text_accessor(field)))
        }
        FilterOp::Neq => {
            params.push_value(value);
            match classify(field) {
                FieldKind::Physical(column) => Ok(format!("{} != ?", column)),
                // NULL-safe: a missing field counts as "not equal"
                _ => Ok(format!(
                    "{} IS NULL OR {} != ?",
                    container_accessor(field),
                    text_accessor(field)
                )),
            }
        }
        FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            params.push_value(value);
            // JSON-stored scalars are text-typed until cast
            Ok(format!(
                "CAST ({} AS NUMERIC) {} ?",
                text_accessor(field),
                numeric_symbol(*op)
            ))
        }
        FilterOp::Like => {
            // case-insensitive substring match
            params.push_text(format!("%{}%", text_of(value)));
            Ok(format!("{} ILIKE ?", text_accessor(field)))
        }
        FilterOp::In => {
            let placeholders = push_list(field, value, params)?;
            Ok(format!("{} IN ({})", text_accessor(field), placeholders))
        }
        FilterOp::NotIn => {
            let placeholders = push_list(field, value, params)?;
            match classify(field) {
                FieldKind::Physical(column) => {
                    Ok(format!("{} NOT IN ({})", column, placeholders))
                }
                // NULL-safe: a missing field counts as "not in"
                _ => Ok(format!(
                    "{} IS NULL OR {} NOT IN ({})",
                    container_accessor(field),
                    text_accessor(field),
                    placeholders
                )),
            }
        }
        FilterOp::Exists => Ok(format!("{} IS NOT NULL ", container_accessor(field))),
        FilterOp::NotExists => Ok(format!("{} IS NULL ", container_accessor(field))),
        FilterOp::Contains => {
            log::error!("{}: {}", UNSUPPORTED_QUERY_OPERATION, op);
            Err(DocStoreError::new(
                &format!("{}: {}", UNSUPPORTED_QUERY_OPERATION, op),
                ErrorKind::UnsupportedOperation,
            ))
        }
    }
}

fn numeric_symbol(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Gt => ">",
        FilterOp::Gte => ">=",
        FilterOp::Lt => "<",
        FilterOp::Lte => "<=",
        _ => unreachable!("not a numeric comparison operator"),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Appends one param per list element, in list order, and returns the
/// matching placeholder sequence (`?, ?, ...`, arity = list length).
fn push_list(field: &str, value: &Value, params: &mut Params) -> DocStoreResult<String> {
    let elements = match value {
        Value::Array(elements) => elements,
        _ => {
            log::error!("IN/NOT_IN filter on {} requires a list value", field);
            return Err(DocStoreError::new(
                &format!("IN/NOT_IN filter on {} requires a list value", field),
                ErrorKind::FilterError,
            ));
        }
    };
    for element in elements {
        params.push_value(element);
    }
    Ok(elements.iter().map(|_| "?").join(", "))
}
