use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// A unique key identifying a document within a collection.
///
/// `Key` is an opaque, immutable identifier. Identity-based operations
/// (upsert, create, update, delete) address documents by their key, and the
/// backend renders it into its physical identifier column as-is.
///
/// # Examples
///
/// ```rust
/// use docstore::Key;
///
/// let key = Key::new("tenant-1:order-42");
/// assert_eq!(key.as_str(), "tenant-1:order-42");
///
/// // a random v4-uuid backed key
/// let other = Key::random();
/// assert_ne!(key, other);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Creates a key from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Key(value.into())
    }

    /// Creates a random key backed by a v4 UUID.
    pub fn random() -> Self {
        Key(Uuid::new_v4().to_string())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = Key::new("k1");
        assert_eq!(key.as_str(), "k1");
        assert_eq!(key.to_string(), "k1");
        assert_eq!(key, Key::from("k1".to_string()));
    }

    #[test]
    fn test_random_keys_are_unique() {
        assert_ne!(Key::random(), Key::random());
    }
}
