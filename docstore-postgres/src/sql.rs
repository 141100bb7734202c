//! Centralized statement templates for the Postgres backend.
//!
//! Keeping every operator-to-syntax mapping in one place makes the statement
//! shapes testable in isolation from execution. `?` placeholders are bound
//! positionally from a [crate::params::Params] accumulator; the only
//! non-parameter interpolations are the table name and compiled predicate
//! text, both produced by this crate.

/// Table layout: a physical key column, the JSONB document blob, and
/// creation/update timestamp columns maintained by the store.
pub fn create_table_sql(table_name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         id TEXT PRIMARY KEY, \
         document JSONB NOT NULL, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
         updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        table_name
    )
}

pub fn drop_table_sql(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table_name)
}

// `xmax <> 0` distinguishes a conflict-update from a fresh insert within the
// same atomic statement.
pub fn upsert_sql(table_name: &str) -> String {
    format!(
        "INSERT INTO {} (id, document) VALUES (?, ?::jsonb) \
         ON CONFLICT (id) DO UPDATE SET document = excluded.document, updated_at = NOW() \
         RETURNING (xmax <> 0) AS existed",
        table_name
    )
}

pub fn upsert_and_return_sql(table_name: &str) -> String {
    format!(
        "INSERT INTO {} (id, document) VALUES (?, ?::jsonb) \
         ON CONFLICT (id) DO UPDATE SET document = excluded.document, updated_at = NOW() \
         RETURNING document",
        table_name
    )
}

pub fn create_sql(table_name: &str) -> String {
    format!(
        "INSERT INTO {} (id, document) VALUES (?, ?::jsonb) \
         ON CONFLICT (id) DO NOTHING RETURNING document",
        table_name
    )
}

/// Conditional replace. The optional predicate is the compiled condition
/// filter; check and write happen in one statement, which is what makes the
/// optimistic-concurrency contract hold.
pub fn update_sql(table_name: &str, condition: Option<&str>) -> String {
    let guard = match condition {
        Some(predicate) => format!(" AND ({})", predicate),
        None => String::new(),
    };
    format!(
        "UPDATE {} SET document = ?::jsonb, updated_at = NOW() \
         WHERE id = ?{} RETURNING document",
        table_name, guard
    )
}

pub fn set_sub_doc_sql(table_name: &str) -> String {
    format!(
        "UPDATE {} SET document = jsonb_set(document, ?::text[], ?::jsonb), \
         updated_at = NOW() WHERE id = ?",
        table_name
    )
}

pub fn unset_sub_doc_sql(table_name: &str) -> String {
    format!(
        "UPDATE {} SET document = document #- ?::text[], \
         updated_at = NOW() WHERE id = ?",
        table_name
    )
}

/// Upsert one key and hand back its pre-image in the same statement. Both
/// CTEs see the statement's snapshot, so the captured document is exactly the
/// one the write replaced.
pub fn upsert_returning_pre_image_sql(table_name: &str) -> String {
    format!(
        "WITH old AS (SELECT document FROM {} WHERE id = ?), \
         upserted AS (INSERT INTO {} (id, document) VALUES (?, ?::jsonb) \
         ON CONFLICT (id) DO UPDATE SET document = excluded.document, updated_at = NOW()) \
         SELECT document FROM old",
        table_name, table_name
    )
}

pub fn delete_sql(table_name: &str) -> String {
    format!("DELETE FROM {} WHERE id = ?", table_name)
}

pub fn delete_all_sql(table_name: &str) -> String {
    format!("DELETE FROM {}", table_name)
}

pub fn count_sql(table_name: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_sql_with_and_without_condition() {
        assert_eq!(
            update_sql("mytest", None),
            "UPDATE mytest SET document = ?::jsonb, updated_at = NOW() \
             WHERE id = ? RETURNING document"
        );
        assert_eq!(
            update_sql("mytest", Some("document->>'version' = ?")),
            "UPDATE mytest SET document = ?::jsonb, updated_at = NOW() \
             WHERE id = ? AND (document->>'version' = ?) RETURNING document"
        );
    }

    #[test]
    fn test_statements_embed_table_name() {
        for sql in [
            create_table_sql("orders"),
            drop_table_sql("orders"),
            upsert_sql("orders"),
            upsert_and_return_sql("orders"),
            create_sql("orders"),
            set_sub_doc_sql("orders"),
            unset_sub_doc_sql("orders"),
            upsert_returning_pre_image_sql("orders"),
            delete_sql("orders"),
            delete_all_sql("orders"),
            count_sql("orders"),
        ] {
            assert!(sql.contains("orders"), "missing table name in: {}", sql);
        }
    }

    #[test]
    fn test_upsert_reports_pre_existence() {
        assert!(upsert_sql("mytest").ends_with("RETURNING (xmax <> 0) AS existed"));
        assert!(upsert_and_return_sql("mytest").ends_with("RETURNING document"));
    }
}
