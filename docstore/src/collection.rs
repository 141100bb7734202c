use crate::document::Document;
use crate::errors::DocStoreResult;
use crate::filter::Filter;
use crate::key::Key;
use crate::query::Query;
use crate::stream::DocumentStream;
use indexmap::IndexMap;

/// Fixed message template for filter operators a backend does not support.
///
/// Backends raise an `UnsupportedOperation` error whose message is this
/// template followed by `": "` and the operator name, so the text is stable
/// for tooling and tests.
pub const UNSUPPORTED_QUERY_OPERATION: &str = "Query operation is not supported";

/// Outcome of a [Collection::create] call.
///
/// A create that found the key already occupied is a normal, successful call
/// with `succeeded = false` - not an error. On success the stored document is
/// returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResult {
    pub succeeded: bool,
    pub document: Option<Document>,
}

impl CreateResult {
    pub fn created(document: Document) -> Self {
        CreateResult {
            succeeded: true,
            document: Some(document),
        }
    }

    pub fn already_exists() -> Self {
        CreateResult {
            succeeded: false,
            document: None,
        }
    }
}

/// Outcome of a [Collection::update] call.
///
/// An update whose condition did not hold is a normal, successful call with
/// `succeeded = false` - not an error. On success the updated document is
/// returned.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub succeeded: bool,
    pub document: Option<Document>,
}

impl UpdateResult {
    pub fn updated(document: Document) -> Self {
        UpdateResult {
            succeeded: true,
            document: Some(document),
        }
    }

    pub fn condition_failed() -> Self {
        UpdateResult {
            succeeded: false,
            document: None,
        }
    }
}

/// Trait defining the interface for common operations on a collection of
/// documents.
///
/// A collection is a container for documents, each addressed by a unique
/// [Key]. Implementations translate these operations into their storage
/// backend's native statements; application code stays decoupled from any
/// specific backend.
///
/// Atomicity of individual operations is delegated to the backend:
/// [Collection::create] is atomic with respect to concurrent creates on the
/// same key, and [Collection::update] is an atomic check-and-set against its
/// condition.
pub trait Collection: Send + Sync {
    /// Upserts (creates a new doc or updates if one already exists) the given
    /// document into the doc store.
    ///
    /// # Arguments
    ///
    /// * `key` - Unique key of the document in the collection
    /// * `document` - Document to be upserted
    ///
    /// # Returns
    ///
    /// `true` if this operation resulted in update of an existing document,
    /// `false` otherwise
    fn upsert(&self, key: &Key, document: &Document) -> DocStoreResult<bool>;

    /// Upserts the given document and returns the resulting stored document,
    /// regardless of whether the write was an insert or a replace.
    fn upsert_and_return(&self, key: &Key, document: &Document) -> DocStoreResult<Document>;

    /// Creates a new document if one doesn't exist with the key.
    ///
    /// Never overwrites: if the key is already present the existing document
    /// is left unchanged and the result reports `succeeded = false`.
    fn create(&self, key: &Key, document: &Document) -> DocStoreResult<CreateResult>;

    /// Updates an existing document if the condition evaluates to true.
    ///
    /// The write applies only if the document currently stored under `key`
    /// also satisfies `condition`, as one indivisible check-and-set relative
    /// to concurrent writers on the same key. This provides optimistic
    /// locking: callers typically encode an expected-version check in the
    /// condition.
    ///
    /// # Arguments
    ///
    /// * `key` - Unique key of the document in the collection
    /// * `document` - Replacement document
    /// * `condition` - Filter evaluated against the current document, if any
    fn update(
        &self,
        key: &Key,
        document: &Document,
        condition: Option<&Filter>,
    ) -> DocStoreResult<UpdateResult>;

    /// Updates a sub document at the given dotted path without rewriting the
    /// whole document.
    ///
    /// # Returns
    ///
    /// `true` if a document with the key existed and was patched
    fn update_sub_doc(
        &self,
        key: &Key,
        sub_doc_path: &str,
        sub_document: &Document,
    ) -> DocStoreResult<bool>;

    /// Deletes the sub document at the given dotted path.
    ///
    /// # Returns
    ///
    /// `true` if a document with the key existed
    fn delete_sub_doc(&self, key: &Key, sub_doc_path: &str) -> DocStoreResult<bool>;

    /// Searches for documents matching the query.
    ///
    /// # Returns
    ///
    /// A lazy, single-pass [DocumentStream] of matching documents
    fn search(&self, query: &Query) -> DocStoreResult<DocumentStream>;

    /// Deletes the document with the given key.
    ///
    /// # Returns
    ///
    /// `true` if the document was deleted, `false` otherwise
    fn delete(&self, key: &Key) -> DocStoreResult<bool>;

    /// Deletes all documents in the collection.
    fn delete_all(&self) -> DocStoreResult<bool>;

    /// Returns the number of documents in the collection.
    fn count(&self) -> DocStoreResult<u64>;

    /// Returns the total number of documents matching the query, applying its
    /// filter but ignoring offset and limit.
    fn total(&self, query: &Query) -> DocStoreResult<u64>;

    /// Upserts the given documents in bulk.
    ///
    /// # Returns
    ///
    /// `true` if every entry was upserted
    fn bulk_upsert(&self, documents: &IndexMap<Key, Document>) -> DocStoreResult<bool>;

    /// Upserts the given documents in bulk and returns the previous copies of
    /// those documents.
    ///
    /// This gives callers a single-round-trip read-before-write view of how
    /// the documents looked prior to upserting them. Each key's pre-image is
    /// captured atomically with that key's write; keys that had no prior
    /// document contribute nothing to the returned stream.
    fn bulk_upsert_and_return_older_documents(
        &self,
        documents: &IndexMap<Key, Document>,
    ) -> DocStoreResult<DocumentStream>;

    /// Drops the collection. Irrecoverable.
    fn drop_collection(&self) -> DocStoreResult<()>;
}
