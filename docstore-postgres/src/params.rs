use serde_json::Value;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

/// A value bound to a positional `?` placeholder in compiled SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            SqlValue::Json(json) => Some(json),
            _ => None,
        }
    }
}

impl From<&Value> for SqlValue {
    /// Maps a JSON filter value to its SQL binding.
    ///
    /// Integral numbers bind as `Int`, other numbers as `Float`; arrays and
    /// objects bind as `Json` (they only occur for whole-document bindings,
    /// never for scalar comparisons - `IN` lists are flattened before this
    /// conversion).
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Json(other.clone()),
        }
    }
}

/// An ordered, append-only accumulator of bound values.
///
/// The filter and query compilers append one value per `?` placeholder they
/// emit, in a fixed left-to-right tree traversal order, and the execution
/// layer binds them positionally. One `Params` instance is scoped to exactly
/// one compilation call; it is never shared across calls or reused after
/// consumption.
///
/// The accumulator is sequential by construction and therefore not safe for
/// concurrent appends within a single compilation; compilation itself is a
/// pure, per-call transformation, so independent calls need no coordination.
#[derive(Clone, Default, PartialEq)]
pub struct Params {
    values: SmallVec<[SqlValue; 8]>,
}

impl Params {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Params::default()
    }

    /// Appends a bound value.
    pub fn push(&mut self, value: SqlValue) {
        self.values.push(value);
    }

    /// Appends a JSON filter value, mapped to its SQL binding.
    pub fn push_value(&mut self, value: &Value) {
        self.values.push(SqlValue::from(value));
    }

    /// Appends a text value.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.values.push(SqlValue::Text(text.into()));
    }

    /// Appends a whole JSON document binding.
    pub fn push_json(&mut self, json: Value) {
        self.values.push(SqlValue::Json(json));
    }

    /// The accumulated values, in placeholder emission order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Debug for Params {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}
