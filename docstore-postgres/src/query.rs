//! Assembles full SELECT statements around a compiled filter.

use docstore::errors::DocStoreResult;
use docstore::{Query, SortOrder};
use itertools::Itertools;

use crate::compiler::compile_filter;
use crate::field::{container_accessor, text_accessor, DOCUMENT};
use crate::params::Params;

/// Builds the search statement for a query: projection, the compiled filter
/// as a WHERE clause (omitted entirely if the filter compiles to absent),
/// stable caller-specified ordering, then limit/offset pagination.
///
/// Limit and offset are integral values from the typed [Query] and are
/// emitted as literals; all filter values go through `params`.
pub fn build_search_sql(
    table_name: &str,
    query: &Query,
    params: &mut Params,
) -> DocStoreResult<String> {
    let mut sql = format!("SELECT {} FROM {}", projection(query), table_name);
    append_where(&mut sql, query, params)?;

    if !query.order_bys().is_empty() {
        let order = query
            .order_bys()
            .iter()
            .map(|order_by| {
                let direction = match order_by.order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!("{} {}", text_accessor(&order_by.field), direction)
            })
            .join(", ");
        sql.push_str(&format!(" ORDER BY {}", order));
    }

    if let Some(limit) = query.get_limit() {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = query.get_offset() {
        sql.push_str(&format!(" OFFSET {}", offset));
    }
    Ok(sql)
}

/// Builds the total-count statement for a query: the same filter, but
/// ignoring ordering, limit, and offset, so callers get the accurate
/// result-set size independent of the current page.
pub fn build_total_sql(
    table_name: &str,
    query: &Query,
    params: &mut Params,
) -> DocStoreResult<String> {
    let mut sql = format!("SELECT COUNT(*) FROM {}", table_name);
    append_where(&mut sql, query, params)?;
    Ok(sql)
}

fn append_where(sql: &mut String, query: &Query, params: &mut Params) -> DocStoreResult<()> {
    if let Some(filter) = query.filter() {
        if let Some(predicate) = compile_filter(filter, params)? {
            sql.push_str(&format!(" WHERE {}", predicate));
        }
    }
    Ok(())
}

/// Renders the projection clause. With no selections whole documents come
/// back; with selections a `json_build_object` keeps every result row a
/// single `document` column.
fn projection(query: &Query) -> String {
    if query.selections().is_empty() {
        return DOCUMENT.to_string();
    }
    let pairs = query
        .selections()
        .iter()
        .map(|selection| format!("'{}', {}", selection, container_accessor(selection)))
        .join(", ");
    format!("json_build_object({}) AS {}", pairs, DOCUMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SqlValue;
    use docstore::filter::{field, Filter, LogicalOp};
    use docstore::{Query, SortOrder};

    #[test]
    fn test_match_all_query() {
        let mut params = Params::new();
        let sql = build_search_sql("mytest", &Query::new(), &mut params).unwrap();
        assert_eq!(sql, "SELECT document FROM mytest");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filtered_query() {
        let mut params = Params::new();
        let query = Query::new().with_filter(field("key1").eq("val1"));
        let sql = build_search_sql("mytest", &query, &mut params).unwrap();
        assert_eq!(
            sql,
            "SELECT document FROM mytest WHERE document->>'key1' = ?"
        );
        assert_eq!(params.values(), [SqlValue::Text("val1".to_string())]);
    }

    #[test]
    fn test_empty_filter_emits_no_where_clause() {
        let mut params = Params::new();
        let query = Query::new().with_filter(Filter::composite(LogicalOp::And, None, None));
        let sql = build_search_sql("mytest", &query, &mut params).unwrap();
        assert_eq!(sql, "SELECT document FROM mytest");
    }

    #[test]
    fn test_ordering_and_pagination() {
        let mut params = Params::new();
        let query = Query::new()
            .order_by("age", SortOrder::Descending)
            .order_by("id", SortOrder::Ascending)
            .limit(5)
            .offset(10);
        let sql = build_search_sql("mytest", &query, &mut params).unwrap();
        assert_eq!(
            sql,
            "SELECT document FROM mytest \
             ORDER BY document->>'age' DESC, id ASC LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_projection() {
        let mut params = Params::new();
        let query = Query::new().select("name").select("address.city");
        let sql = build_search_sql("mytest", &query, &mut params).unwrap();
        assert_eq!(
            sql,
            "SELECT json_build_object('name', document->'name', \
             'address.city', document->'address'->'city') AS document FROM mytest"
        );
    }

    #[test]
    fn test_total_ignores_pagination() {
        let mut params = Params::new();
        let query = Query::new()
            .with_filter(field("key1").eq("val1"))
            .order_by("age", SortOrder::Ascending)
            .limit(5)
            .offset(10);
        let sql = build_total_sql("mytest", &query, &mut params).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM mytest WHERE document->>'key1' = ?"
        );
        assert_eq!(params.len(), 1);
    }
}
