use docstore::constants::DOC_ID;
use itertools::Itertools;

/// Physical identifier column.
pub const ID: &str = "id";
/// Physical creation-timestamp column.
pub const CREATED_AT: &str = "created_at";
/// Physical last-update-timestamp column.
pub const UPDATED_AT: &str = "updated_at";
/// JSONB column holding the document blob.
pub const DOCUMENT: &str = "document";

/// Columns that exist as dedicated, typed table columns. Every other field
/// name addresses into the JSONB document blob.
pub const OUTER_COLUMNS: [&str; 3] = [ID, CREATED_AT, UPDATED_AT];

/// Compile-time classification of a filter field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind<'a> {
    /// A dedicated, typed table column; compiles to the bare column name.
    Physical(&'a str),
    /// The reserved document-identifier alias; always routes to the JSON
    /// `_id` key of the blob, never to the physical key column (the two may
    /// differ in composite-key scenarios).
    DocumentId,
    /// A dotted path into the JSONB blob.
    Json(&'a str),
}

pub(crate) fn classify(field: &str) -> FieldKind<'_> {
    if OUTER_COLUMNS.contains(&field) {
        FieldKind::Physical(field)
    } else if field == DOC_ID {
        FieldKind::DocumentId
    } else {
        FieldKind::Json(field)
    }
}

// Field names are caller code, not user data, but they still land inside
// quoted JSON accessors; doubling quotes keeps the output well-formed.
fn quote_segment(segment: &str) -> String {
    format!("'{}'", segment.replace('\'', "''"))
}

/// Renders the text-extraction accessor for a field.
///
/// Physical columns compile to the bare column name. JSON fields compile to a
/// chain of `->` object navigations ending in a `->>` text extraction, e.g.
/// `a.b.c` becomes `document->'a'->'b'->>'c'`.
pub(crate) fn text_accessor(field: &str) -> String {
    match classify(field) {
        FieldKind::Physical(column) => column.to_string(),
        FieldKind::DocumentId => format!("{}->>{}", DOCUMENT, quote_segment(DOC_ID)),
        FieldKind::Json(path) => {
            let segments: Vec<&str> = path.split('.').collect();
            let (terminal, parents) = segments.split_last().unwrap_or((&path, &[]));
            let mut accessor = DOCUMENT.to_string();
            for parent in parents {
                accessor.push_str(&format!("->{}", quote_segment(parent)));
            }
            accessor.push_str(&format!("->>{}", quote_segment(terminal)));
            accessor
        }
    }
}

/// Renders the container accessor for a field: every segment navigates with
/// `->`, so `IS [NOT] NULL` can be tested on the JSON container itself.
///
/// Used for existence checks and for the NULL-safety clause of the negation
/// operators.
pub(crate) fn container_accessor(field: &str) -> String {
    match classify(field) {
        FieldKind::Physical(column) => column.to_string(),
        FieldKind::DocumentId => format!("{}->{}", DOCUMENT, quote_segment(DOC_ID)),
        FieldKind::Json(path) => {
            let chain = path
                .split('.')
                .map(|segment| format!("->{}", quote_segment(segment)))
                .join("");
            format!("{}{}", DOCUMENT, chain)
        }
    }
}

/// Renders a dotted sub-document path as a Postgres text-array literal, for
/// `jsonb_set` / `#-` path arguments (e.g. `a.b` becomes `{a,b}`).
pub(crate) fn path_array_literal(sub_doc_path: &str) -> String {
    format!("{{{}}}", sub_doc_path.split('.').join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify(ID), FieldKind::Physical(ID));
        assert_eq!(classify(CREATED_AT), FieldKind::Physical(CREATED_AT));
        assert_eq!(classify(UPDATED_AT), FieldKind::Physical(UPDATED_AT));
        assert_eq!(classify(DOC_ID), FieldKind::DocumentId);
        assert_eq!(classify("key1"), FieldKind::Json("key1"));
        assert_eq!(classify("a.b.c"), FieldKind::Json("a.b.c"));
    }

    #[test]
    fn test_text_accessor() {
        assert_eq!(text_accessor(ID), "id");
        assert_eq!(text_accessor("key1"), "document->>'key1'");
        assert_eq!(text_accessor("a.b.c"), "document->'a'->'b'->>'c'");
        assert_eq!(text_accessor(DOC_ID), "document->>'_id'");
    }

    #[test]
    fn test_container_accessor() {
        assert_eq!(container_accessor("key1"), "document->'key1'");
        assert_eq!(container_accessor("key1.key2"), "document->'key1'->'key2'");
        assert_eq!(container_accessor(DOC_ID), "document->'_id'");
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(text_accessor("o'brien"), "document->>'o''brien'");
    }

    #[test]
    fn test_path_array_literal() {
        assert_eq!(path_array_literal("a"), "{a}");
        assert_eq!(path_array_literal("a.b.c"), "{a,b,c}");
    }
}
