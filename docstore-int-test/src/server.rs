//! An in-memory stand-in for the postgres execution boundary.
//!
//! `InMemoryPostgres` implements [PostgresClient] by interpreting exactly the
//! statement shapes the adapter emits (its templates are compared against the
//! adapter's own `sql` module, so the double cannot drift from the real
//! statements) and evaluating compiled WHERE clauses with the
//! [crate::predicate] grammar. It gives the integration tests real
//! end-to-end coverage of the mutation protocol and the search pipeline
//! without a running database.

use chrono::Utc;
use dashmap::DashMap;
use docstore::errors::{DocStoreError, DocStoreResult, ErrorKind};
use docstore_postgres::{sql, Params, PostgresClient, Row, RowStream, SqlValue};
use indexmap::IndexMap;
use serde_json::Value;

use crate::predicate::{
    parse_field_ref, parse_predicate, parse_projection, text_of, FieldRef, Pred, ValueSource,
};

#[derive(Debug, Clone)]
struct TableRow {
    document: Value,
    created_at: String,
    updated_at: String,
}

struct RowView<'a> {
    id: &'a str,
    row: &'a TableRow,
}

impl ValueSource for RowView<'_> {
    fn column_text(&self, column: &str) -> Option<String> {
        match column {
            "id" => Some(self.id.to_string()),
            "created_at" => Some(self.row.created_at.clone()),
            "updated_at" => Some(self.row.updated_at.clone()),
            _ => None,
        }
    }

    fn json_value(&self, path: &[String]) -> Option<&Value> {
        let mut current = &self.row.document;
        for segment in path {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// In-memory table registry keyed by table name; each table preserves
/// insertion order so unordered scans are deterministic.
#[derive(Default)]
pub struct InMemoryPostgres {
    tables: DashMap<String, IndexMap<String, TableRow>>,
}

impl InMemoryPostgres {
    pub fn new() -> Self {
        InMemoryPostgres::default()
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    fn with_table<T>(
        &self,
        table: &str,
        operation: impl FnOnce(&mut IndexMap<String, TableRow>) -> DocStoreResult<T>,
    ) -> DocStoreResult<T> {
        match self.tables.get_mut(table) {
            Some(mut entry) => operation(entry.value_mut()),
            None => Err(backend_error(&format!("relation {} does not exist", table))),
        }
    }

    /// Insert-or-replace; returns whether a prior row existed.
    fn apply_upsert(&self, table: &str, key: &str, document: Value) -> DocStoreResult<bool> {
        self.with_table(table, |rows| match rows.get_mut(key) {
            Some(row) => {
                row.document = document;
                row.updated_at = Self::now();
                Ok(true)
            }
            None => {
                let now = Self::now();
                rows.insert(
                    key.to_string(),
                    TableRow {
                        document,
                        created_at: now.clone(),
                        updated_at: now,
                    },
                );
                Ok(false)
            }
        })
    }

    fn matching_rows(
        &self,
        table: &str,
        predicate: Option<&Pred>,
        params: &[SqlValue],
    ) -> DocStoreResult<Vec<(String, TableRow)>> {
        self.with_table(table, |rows| {
            Ok(rows
                .iter()
                .filter(|(id, row)| match predicate {
                    Some(pred) => pred.matches(&RowView { id: id.as_str(), row }, params),
                    None => true,
                })
                .map(|(id, row)| (id.clone(), row.clone()))
                .collect())
        })
    }

    fn run_select(&self, sql_text: &str, params: &[SqlValue]) -> DocStoreResult<Vec<Row>> {
        let select = SelectParts::parse(sql_text)?;
        let predicate = select
            .where_clause
            .map(|clause| parse_predicate(clause, 0).map_err(|e| backend_error(&e)))
            .transpose()?;

        if select.projection == "COUNT(*)" {
            let matched = self.matching_rows(&select.table, predicate.as_ref(), params)?;
            return Ok(vec![Row::new(vec![SqlValue::Int(matched.len() as i64)])]);
        }

        let mut matched = self.matching_rows(&select.table, predicate.as_ref(), params)?;

        if let Some(order_clause) = select.order_by {
            let terms = parse_order_terms(order_clause)?;
            matched.sort_by(|(left_id, left_row), (right_id, right_row)| {
                for (field, ascending) in &terms {
                    let left = text_of(field, &RowView { id: left_id.as_str(), row: left_row });
                    let right = text_of(field, &RowView { id: right_id.as_str(), row: right_row });
                    // SQL NULL sorts last ascending, first descending
                    let ordering = match (&left, &right) {
                        (None, None) => std::cmp::Ordering::Equal,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (Some(l), Some(r)) => l.cmp(r),
                    };
                    let ordering = if *ascending { ordering } else { ordering.reverse() };
                    if ordering != std::cmp::Ordering::Equal {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let offset = select.offset.unwrap_or(0);
        let limit = select.limit.unwrap_or(u64::MAX);
        let page = matched
            .into_iter()
            .skip(offset as usize)
            .take(limit.min(usize::MAX as u64) as usize);

        let mut out = Vec::new();
        for (id, row) in page {
            let view = RowView { id: id.as_str(), row: &row };
            let value = project(select.projection, &view)?;
            out.push(Row::new(vec![SqlValue::Json(value)]));
        }
        Ok(out)
    }
}

fn backend_error(message: &str) -> DocStoreError {
    DocStoreError::new(message, ErrorKind::BackendError)
}

fn param_str(params: &[SqlValue], index: usize) -> DocStoreResult<&str> {
    params
        .get(index)
        .and_then(SqlValue::as_text)
        .ok_or_else(|| backend_error(&format!("missing text parameter {}", index)))
}

fn param_json(params: &[SqlValue], index: usize) -> DocStoreResult<Value> {
    let param = params.get(index);
    match param.and_then(SqlValue::as_json) {
        Some(json) => Ok(json.clone()),
        // `?::jsonb` also accepts a text parameter holding JSON
        None => match param {
            Some(SqlValue::Text(text)) => {
                serde_json::from_str(text).map_err(|e| backend_error(&e.to_string()))
            }
            other => Err(backend_error(&format!(
                "parameter {} is not json: {:?}",
                index, other
            ))),
        },
    }
}

/// Pulls the table name out of a statement, right after its leading keyword
/// phrase. Table names contain no spaces or parens.
fn table_of(sql_text: &str) -> DocStoreResult<String> {
    const MARKERS: [&str; 6] = [
        "CREATE TABLE IF NOT EXISTS ",
        "DROP TABLE IF EXISTS ",
        "INSERT INTO ",
        "UPDATE ",
        "DELETE FROM ",
        "WITH old AS (SELECT document FROM ",
    ];
    for marker in MARKERS {
        if let Some(rest) = sql_text.strip_prefix(marker) {
            let table: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != '(')
                .collect();
            return Ok(table);
        }
    }
    Err(backend_error(&format!("unrecognized statement: {}", sql_text)))
}

struct SelectParts<'a> {
    projection: &'a str,
    table: String,
    where_clause: Option<&'a str>,
    order_by: Option<&'a str>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'a> SelectParts<'a> {
    fn parse(sql_text: &'a str) -> DocStoreResult<Self> {
        let rest = sql_text
            .strip_prefix("SELECT ")
            .ok_or_else(|| backend_error(&format!("not a select: {}", sql_text)))?;
        let (projection, rest) = rest
            .split_once(" FROM ")
            .ok_or_else(|| backend_error(&format!("select without FROM: {}", sql_text)))?;

        // clauses appear in a fixed order; peel them off back to front
        let (rest, offset) = split_tail(rest, " OFFSET ");
        let (rest, limit) = split_tail(rest, " LIMIT ");
        let (rest, order_by) = split_clause(rest, " ORDER BY ");
        let (table, where_clause) = split_clause(rest, " WHERE ");

        let parse_number = |text: Option<&str>| -> DocStoreResult<Option<u64>> {
            text.map(|t| t.parse().map_err(|_| backend_error("bad page size")))
                .transpose()
        };
        Ok(SelectParts {
            projection,
            table: table.to_string(),
            where_clause,
            order_by,
            limit: parse_number(limit)?,
            offset: parse_number(offset)?,
        })
    }
}

fn split_clause<'a>(text: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    match text.find(marker) {
        Some(at) => (&text[..at], Some(&text[at + marker.len()..])),
        None => (text, None),
    }
}

fn split_tail<'a>(text: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    match text.rfind(marker) {
        Some(at) => (&text[..at], Some(&text[at + marker.len()..])),
        None => (text, None),
    }
}

fn parse_order_terms(clause: &str) -> DocStoreResult<Vec<(FieldRef, bool)>> {
    clause
        .split(", ")
        .map(|term| {
            let (field_text, ascending) = if let Some(head) = term.strip_suffix(" DESC") {
                (head, false)
            } else if let Some(head) = term.strip_suffix(" ASC") {
                (head, true)
            } else {
                (term, true)
            };
            let field = parse_field_ref(field_text).map_err(|e| backend_error(&e))?;
            Ok((field, ascending))
        })
        .collect()
}

fn project(projection: &str, view: &RowView<'_>) -> DocStoreResult<Value> {
    if projection == "document" {
        return Ok(view.row.document.clone());
    }
    let pairs = projection
        .strip_prefix("json_build_object(")
        .and_then(|rest| rest.strip_suffix(") AS document"))
        .ok_or_else(|| backend_error(&format!("unrecognized projection: {}", projection)))?;
    let mut object = serde_json::Map::new();
    for (name, field) in parse_projection(pairs).map_err(|e| backend_error(&e))? {
        let value = match &field {
            FieldRef::Column(_) => text_of(&field, view).map(Value::String),
            FieldRef::JsonContainer(path) | FieldRef::JsonText(path) => {
                view.json_value(path).cloned()
            }
        };
        object.insert(name, value.unwrap_or(Value::Null));
    }
    Ok(Value::Object(object))
}

/// Parses a postgres text-array literal (`{a,b,c}`) into path segments.
fn parse_path_literal(literal: &str) -> DocStoreResult<Vec<String>> {
    literal
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(|inner| inner.split(',').map(str::to_string).collect())
        .ok_or_else(|| backend_error(&format!("bad path literal: {}", literal)))
}

/// `jsonb_set` semantics: the terminal key is created or replaced, but only
/// if every parent on the path already exists as an object.
fn set_path(document: &mut Value, path: &[String], new_value: Value) {
    let Some((terminal, parents)) = path.split_last() else {
        return;
    };
    let mut current = document;
    for parent in parents {
        match current.as_object_mut().and_then(|map| map.get_mut(parent)) {
            Some(child) => current = child,
            None => return,
        }
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(terminal.clone(), new_value);
    }
}

/// `#-` semantics: removes the terminal key if the whole path exists.
fn unset_path(document: &mut Value, path: &[String]) {
    let Some((terminal, parents)) = path.split_last() else {
        return;
    };
    let mut current = document;
    for parent in parents {
        match current.as_object_mut().and_then(|map| map.get_mut(parent)) {
            Some(child) => current = child,
            None => return,
        }
    }
    if let Some(map) = current.as_object_mut() {
        map.remove(terminal);
    }
}

impl PostgresClient for InMemoryPostgres {
    fn execute_query(&self, sql_text: &str, params: &Params) -> DocStoreResult<RowStream> {
        let params = params.values().to_vec();
        let rows: Vec<Row> = if sql_text.starts_with("SELECT ") {
            self.run_select(sql_text, &params)?
        } else {
            let table = table_of(sql_text)?;
            if sql_text == sql::upsert_sql(&table) {
                let key = param_str(&params, 0)?.to_string();
                let existed = self.apply_upsert(&table, &key, param_json(&params, 1)?)?;
                vec![Row::new(vec![SqlValue::Bool(existed)])]
            } else if sql_text == sql::upsert_and_return_sql(&table) {
                let key = param_str(&params, 0)?.to_string();
                let document = param_json(&params, 1)?;
                self.apply_upsert(&table, &key, document.clone())?;
                vec![Row::new(vec![SqlValue::Json(document)])]
            } else if sql_text == sql::create_sql(&table) {
                let key = param_str(&params, 0)?.to_string();
                let document = param_json(&params, 1)?;
                self.with_table(&table, |table_rows| {
                    if table_rows.contains_key(&key) {
                        // ON CONFLICT DO NOTHING: no returned row
                        Ok(vec![])
                    } else {
                        let now = Self::now();
                        table_rows.insert(
                            key.clone(),
                            TableRow {
                                document: document.clone(),
                                created_at: now.clone(),
                                updated_at: now,
                            },
                        );
                        Ok(vec![Row::new(vec![SqlValue::Json(document.clone())])])
                    }
                })?
            } else if sql_text == sql::upsert_returning_pre_image_sql(&table) {
                let key = param_str(&params, 0)?.to_string();
                let document = param_json(&params, 2)?;
                self.with_table(&table, |table_rows| {
                    let pre_image = table_rows.get(&key).map(|row| row.document.clone());
                    match table_rows.get_mut(&key) {
                        Some(row) => {
                            row.document = document.clone();
                            row.updated_at = Self::now();
                        }
                        None => {
                            let now = Self::now();
                            table_rows.insert(
                                key.clone(),
                                TableRow {
                                    document: document.clone(),
                                    created_at: now.clone(),
                                    updated_at: now,
                                },
                            );
                        }
                    }
                    Ok(pre_image
                        .map(|old| vec![Row::new(vec![SqlValue::Json(old)])])
                        .unwrap_or_default())
                })?
            } else if sql_text.starts_with(&format!("UPDATE {} SET document = ?::jsonb", table)) {
                self.run_conditional_update(&table, sql_text, &params)?
            } else {
                return Err(backend_error(&format!(
                    "unrecognized query statement: {}",
                    sql_text
                )));
            }
        };
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn execute_update(&self, sql_text: &str, params: &Params) -> DocStoreResult<u64> {
        let params = params.values().to_vec();
        let table = table_of(sql_text)?;
        if sql_text == sql::create_table_sql(&table) {
            self.tables.entry(table).or_default();
            Ok(0)
        } else if sql_text == sql::drop_table_sql(&table) {
            self.tables.remove(&table);
            Ok(0)
        } else if sql_text == sql::delete_sql(&table) {
            let key = param_str(&params, 0)?.to_string();
            self.with_table(&table, |rows| {
                Ok(rows.shift_remove(&key).is_some() as u64)
            })
        } else if sql_text == sql::delete_all_sql(&table) {
            self.with_table(&table, |rows| {
                let removed = rows.len() as u64;
                rows.clear();
                Ok(removed)
            })
        } else if sql_text == sql::set_sub_doc_sql(&table) {
            let path = parse_path_literal(param_str(&params, 0)?)?;
            let sub_document = param_json(&params, 1)?;
            let key = param_str(&params, 2)?.to_string();
            self.with_table(&table, |rows| match rows.get_mut(&key) {
                Some(row) => {
                    set_path(&mut row.document, &path, sub_document);
                    row.updated_at = Self::now();
                    Ok(1)
                }
                None => Ok(0),
            })
        } else if sql_text == sql::unset_sub_doc_sql(&table) {
            let path = parse_path_literal(param_str(&params, 0)?)?;
            let key = param_str(&params, 1)?.to_string();
            self.with_table(&table, |rows| match rows.get_mut(&key) {
                Some(row) => {
                    unset_path(&mut row.document, &path);
                    row.updated_at = Self::now();
                    Ok(1)
                }
                None => Ok(0),
            })
        } else {
            Err(backend_error(&format!(
                "unrecognized update statement: {}",
                sql_text
            )))
        }
    }
}

impl InMemoryPostgres {
    /// Handles `UPDATE ... WHERE id = ? [AND (<condition>)] RETURNING
    /// document` as one atomic check-and-set against the table lock.
    fn run_conditional_update(
        &self,
        table: &str,
        sql_text: &str,
        params: &[SqlValue],
    ) -> DocStoreResult<Vec<Row>> {
        let condition = if sql_text == sql::update_sql(table, None) {
            None
        } else {
            let prefix = format!(
                "UPDATE {} SET document = ?::jsonb, updated_at = NOW() WHERE id = ? AND (",
                table
            );
            let clause = sql_text
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(") RETURNING document"))
                .ok_or_else(|| {
                    backend_error(&format!("unrecognized update statement: {}", sql_text))
                })?;
            // condition placeholders come after the document and key params
            Some(parse_predicate(clause, 2).map_err(|e| backend_error(&e))?)
        };

        let document = param_json(params, 0)?;
        let key = param_str(params, 1)?.to_string();
        self.with_table(table, |rows| {
            let Some(row) = rows.get_mut(&key) else {
                return Ok(vec![]);
            };
            if let Some(pred) = &condition {
                let view = RowView { id: key.as_str(), row };
                if !pred.matches(&view, params) {
                    return Ok(vec![]);
                }
            }
            row.document = document.clone();
            row.updated_at = Self::now();
            Ok(vec![Row::new(vec![SqlValue::Json(document.clone())])])
        })
    }
}
