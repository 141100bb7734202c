use docstore::errors::{DocStoreError, DocStoreResult, ErrorKind};
use serde_json::Value;

use crate::params::{Params, SqlValue};

/// A single result row, exposing typed positional column access.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<SqlValue>) -> Self {
        Row { columns }
    }

    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.columns.get(index)
    }

    /// Reads a boolean column.
    pub fn get_bool(&self, index: usize) -> DocStoreResult<bool> {
        match self.get(index) {
            Some(SqlValue::Bool(b)) => Ok(*b),
            other => Err(column_type_error(index, "bool", other)),
        }
    }

    /// Reads an integer column.
    pub fn get_i64(&self, index: usize) -> DocStoreResult<i64> {
        match self.get(index) {
            Some(SqlValue::Int(i)) => Ok(*i),
            other => Err(column_type_error(index, "bigint", other)),
        }
    }

    /// Reads a text column.
    pub fn get_text(&self, index: usize) -> DocStoreResult<&str> {
        match self.get(index) {
            Some(SqlValue::Text(text)) => Ok(text),
            other => Err(column_type_error(index, "text", other)),
        }
    }

    /// Reads a JSON column. Text columns holding JSON are parsed.
    pub fn get_json(&self, index: usize) -> DocStoreResult<Value> {
        match self.get(index) {
            Some(SqlValue::Json(json)) => Ok(json.clone()),
            Some(SqlValue::Text(text)) => Ok(serde_json::from_str(text)?),
            other => Err(column_type_error(index, "json", other)),
        }
    }
}

fn column_type_error(index: usize, expected: &str, actual: Option<&SqlValue>) -> DocStoreError {
    log::error!("Column {} is not {}: {:?}", index, expected, actual);
    DocStoreError::new(
        &format!("Column {} is not {}: {:?}", index, expected, actual),
        ErrorKind::BackendError,
    )
}

/// A lazy cursor over result rows.
pub type RowStream = Box<dyn Iterator<Item = DocStoreResult<Row>>>;

/// The storage engine's query-execution boundary.
///
/// Implementations consume compiled statement text plus a [Params]
/// accumulator, binding its values positionally onto the `?` placeholders.
/// Connection pooling, transactions, timeouts, and retries all live behind
/// this seam; this crate never retries an execution failure.
pub trait PostgresClient: Send + Sync {
    /// Executes a statement returning rows.
    fn execute_query(&self, sql: &str, params: &Params) -> DocStoreResult<RowStream>;

    /// Executes a statement returning an affected-row count.
    fn execute_update(&self, sql: &str, params: &Params) -> DocStoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_column_access() {
        let row = Row::new(vec![
            SqlValue::Bool(true),
            SqlValue::Int(7),
            SqlValue::Text("hello".to_string()),
            SqlValue::Json(json!({"a": 1})),
        ]);
        assert!(row.get_bool(0).unwrap());
        assert_eq!(row.get_i64(1).unwrap(), 7);
        assert_eq!(row.get_text(2).unwrap(), "hello");
        assert_eq!(row.get_json(3).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_json_from_text_column() {
        let row = Row::new(vec![SqlValue::Text(r#"{"a":1}"#.to_string())]);
        assert_eq!(row.get_json(0).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_type_mismatch() {
        let row = Row::new(vec![SqlValue::Int(1)]);
        let err = row.get_bool(0).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert!(row.get_bool(5).is_err());
    }
}
