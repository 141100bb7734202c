use crate::filter::Filter;

/// Sort direction for an ordered query field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A single ordering term: a field path and a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// A query over a collection: an optional filter plus ordering, projection,
/// and pagination.
///
/// An absent filter means "match all". The backend applies the caller-given
/// sort fields in order (stable), then limit/offset for pagination.
/// Selections name the document fields to project; an empty selection list
/// returns whole documents.
///
/// `Query` supports method chaining for convenient configuration:
///
/// ```rust
/// use docstore::{Query, SortOrder};
/// use docstore::filter::field;
///
/// let query = Query::new()
///     .with_filter(field("status").eq("ACTIVE"))
///     .order_by("created_at", SortOrder::Descending)
///     .limit(20)
///     .offset(40);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Option<Filter>,
    order_bys: Vec<OrderBy>,
    selections: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Creates a query matching all documents.
    pub fn new() -> Self {
        Query::default()
    }

    /// Sets the filter for this query.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Appends an ordering term. Terms are applied in the order they are
    /// added.
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_bys.push(OrderBy {
            field: field.to_string(),
            order,
        });
        self
    }

    /// Appends a field path to project into the result documents.
    pub fn select(mut self, field: &str) -> Self {
        self.selections.push(field.to_string());
        self
    }

    /// Caps the number of returned documents.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` matching documents.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn order_bys(&self) -> &[OrderBy] {
        &self.order_bys
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::field;

    #[test]
    fn test_default_matches_all() {
        let query = Query::new();
        assert!(query.filter().is_none());
        assert!(query.order_bys().is_empty());
        assert!(query.selections().is_empty());
        assert_eq!(query.get_limit(), None);
        assert_eq!(query.get_offset(), None);
    }

    #[test]
    fn test_chained_configuration() {
        let query = Query::new()
            .with_filter(field("a").eq(1))
            .order_by("a", SortOrder::Ascending)
            .order_by("b", SortOrder::Descending)
            .select("a")
            .limit(10)
            .offset(5);

        assert!(query.filter().is_some());
        assert_eq!(query.order_bys().len(), 2);
        assert_eq!(query.order_bys()[1].order, SortOrder::Descending);
        assert_eq!(query.selections(), ["a".to_string()]);
        assert_eq!(query.get_limit(), Some(10));
        assert_eq!(query.get_offset(), Some(5));
    }
}
