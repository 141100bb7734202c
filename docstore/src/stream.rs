use crate::document::Document;
use crate::errors::DocStoreResult;

/// A lazy, single-pass cursor over documents.
///
/// `DocumentStream` yields matching documents as they are fetched from the
/// backend. It is finite and non-restartable: once consumed it cannot be
/// rewound, and dropping it releases the underlying backend cursor.
pub struct DocumentStream {
    underlying: Box<dyn Iterator<Item = DocStoreResult<Document>>>,
}

impl DocumentStream {
    /// Wraps a backend iterator into a document stream.
    pub fn new(iter: Box<dyn Iterator<Item = DocStoreResult<Document>>>) -> Self {
        DocumentStream { underlying: iter }
    }

    /// Creates an empty stream.
    pub fn empty() -> Self {
        DocumentStream {
            underlying: Box::new(std::iter::empty()),
        }
    }

    /// Drains the stream, failing on the first backend error.
    pub fn collect_documents(self) -> DocStoreResult<Vec<Document>> {
        self.collect()
    }
}

impl std::fmt::Debug for DocumentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStream").finish_non_exhaustive()
    }
}

impl Iterator for DocumentStream {
    type Item = DocStoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.underlying.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_is_single_pass() {
        let docs = vec![
            Ok(Document::from(json!({"n": 1}))),
            Ok(Document::from(json!({"n": 2}))),
        ];
        let mut stream = DocumentStream::new(Box::new(docs.into_iter()));
        assert!(stream.next().is_some());
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        // exhausted for good
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_collect_documents() {
        let docs = vec![Ok(Document::from(json!({"n": 1})))];
        let stream = DocumentStream::new(Box::new(docs.into_iter()));
        let collected = stream.collect_documents().unwrap();
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn test_empty_stream() {
        assert!(DocumentStream::empty().next().is_none());
    }
}
