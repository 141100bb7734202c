use serde_json::Value;

use super::{Filter, FilterOp};

/// Creates a fluent filter builder for the specified field name.
///
/// This function initializes a filter builder that allows chaining of
/// comparison operations on a specific field. The returned `FluentFilter`
/// provides methods for building equality, comparison, pattern-matching, and
/// existence filters.
///
/// # Arguments
///
/// * `field_name` - Dotted path of the field to filter on
///
/// # Returns
///
/// A `FluentFilter` builder for constructing field-specific filters
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for constructing filters on a specific field.
///
/// `FluentFilter` provides chainable methods for creating leaf filters with
/// various conditions. Each method returns a [Filter] that can be used
/// directly in a query or combined with other filters via
/// [Filter::and] / [Filter::or].
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Creates a filter that matches documents where the field equals the
    /// specified value.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Eq, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field does not equal
    /// the specified value. A missing field counts as "not equal".
    #[inline]
    pub fn neq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Neq, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field is numerically
    /// greater than the specified value.
    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Gt, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field is numerically
    /// greater than or equal to the specified value.
    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Gte, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field is numerically
    /// less than the specified value.
    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Lt, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field is numerically
    /// less than or equal to the specified value.
    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Lte, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field contains the
    /// specified value as a case-insensitive substring.
    #[inline]
    pub fn like(self, value: &str) -> Filter {
        Filter::leaf(FilterOp::Like, self.field_name, value)
    }

    /// Creates a filter that matches documents where the field equals one of
    /// the listed values.
    #[inline]
    pub fn is_in<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Filter::leaf(FilterOp::In, self.field_name, values)
    }

    /// Creates a filter that matches documents where the field equals none of
    /// the listed values. A missing field counts as "not in".
    #[inline]
    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Filter::leaf(FilterOp::NotIn, self.field_name, values)
    }

    /// Creates a filter that matches documents where the field is present.
    #[inline]
    pub fn exists(self) -> Filter {
        Filter::leaf(FilterOp::Exists, self.field_name, Value::Null)
    }

    /// Creates a filter that matches documents where the field is absent.
    #[inline]
    pub fn not_exists(self) -> Filter {
        Filter::leaf(FilterOp::NotExists, self.field_name, Value::Null)
    }

    /// Creates a filter that matches documents where the field (an array)
    /// contains the specified value.
    #[inline]
    pub fn contains<T: Into<Value>>(self, value: T) -> Filter {
        Filter::leaf(FilterOp::Contains, self.field_name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fluent_leaf() {
        let filter = field("age").gte(18);
        assert_eq!(filter, Filter::leaf(FilterOp::Gte, "age", 18));
    }

    #[test]
    fn test_fluent_in_list() {
        let filter = field("status").is_in(vec!["NEW", "ACTIVE"]);
        assert_eq!(
            filter,
            Filter::leaf(FilterOp::In, "status", json!(["NEW", "ACTIVE"]))
        );
    }

    #[test]
    fn test_fluent_existence() {
        assert_eq!(
            field("tags").exists(),
            Filter::leaf(FilterOp::Exists, "tags", Value::Null)
        );
        assert_eq!(
            field("tags").not_exists(),
            Filter::leaf(FilterOp::NotExists, "tags", Value::Null)
        );
    }

    #[test]
    fn test_fluent_composition() {
        let filter = field("a").eq(1).and(field("b").neq(2)).or(field("c").like("x"));
        assert!(matches!(filter, Filter::Composite { .. }));
    }
}
