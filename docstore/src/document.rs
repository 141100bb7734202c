use crate::errors::DocStoreResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// An opaque, JSON-serializable document.
///
/// `Document` is the unit of storage in a collection. The store never
/// interprets its internal structure except for field-path addressing during
/// filtering and sub-document mutation: a dotted path like `address.city`
/// navigates nested objects, one segment per level.
///
/// Documents are produced by callers and returned by the store; their
/// lifetimes are caller-owned and the store never retains references beyond a
/// single call.
///
/// # Examples
///
/// ```rust
/// use docstore::Document;
/// use serde_json::json;
///
/// let doc = Document::from(json!({"name": "Alice", "address": {"city": "NYC"}}));
/// assert_eq!(doc.get("address.city"), Some(&json!("NYC")));
/// assert_eq!(doc.get("address.zip"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    /// Creates an empty document (an empty JSON object).
    pub fn new() -> Self {
        Document(Value::Object(serde_json::Map::new()))
    }

    /// Parses a document from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `json` - A JSON text representation of the document
    ///
    /// # Returns
    ///
    /// The parsed document, or an [crate::errors::ErrorKind::EncodingError]
    /// if the text is not valid JSON.
    pub fn parse(json: &str) -> DocStoreResult<Self> {
        match serde_json::from_str(json) {
            Ok(value) => Ok(Document(value)),
            Err(e) => {
                log::error!("Failed to parse document JSON: {}", e);
                Err(e.into())
            }
        }
    }

    /// Returns the value at the given dotted field path, if present.
    ///
    /// Each path segment navigates one level of JSON object nesting.
    pub fn get(&self, field_path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in field_path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Display for Document {
    /// Renders the document as compact JSON.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let doc = Document::parse(r#"{"a":1,"b":{"c":"x"}}"#).unwrap();
        assert_eq!(doc.to_string(), r#"{"a":1,"b":{"c":"x"}}"#);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(Document::parse("{not json").is_err());
    }

    #[test]
    fn test_get_nested_path() {
        let doc = Document::from(json!({"a": {"b": {"c": 42}}}));
        assert_eq!(doc.get("a.b.c"), Some(&json!(42)));
        assert_eq!(doc.get("a.b"), Some(&json!({"c": 42})));
        assert_eq!(doc.get("a.x"), None);
        assert_eq!(doc.get("a.b.c.d"), None);
    }

    #[test]
    fn test_get_on_non_object() {
        let doc = Document::from(json!([1, 2, 3]));
        assert_eq!(doc.get("0"), None);
    }
}
