//! # docstore - Document Store Abstraction
//!
//! `docstore` provides a uniform CRUD/query API over a collection of JSON
//! documents, decoupling application code from any specific storage backend.
//!
//! ## Key Features
//!
//! - **Opaque documents**: [Document] wraps arbitrary JSON; the store only
//!   interprets dotted field paths for filtering and sub-document mutation
//! - **Composable filters**: an immutable [filter::Filter] expression tree
//!   with fluent builders and `and`/`or` combinators
//! - **Typed mutation results**: conflict outcomes (create on an existing
//!   key, a failed optimistic-concurrency condition) are results, not errors
//! - **Lazy search**: [DocumentStream] is a finite, single-pass cursor over
//!   matching documents
//! - **Pluggable backends**: the [Collection] trait is the entire backend
//!   contract; adapters live in sibling crates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore::{Collection, Document, Key, Query, SortOrder};
//! use docstore::filter::field;
//!
//! # fn example(collection: &dyn Collection) -> docstore::errors::DocStoreResult<()> {
//! let key = Key::new("order-42");
//! let doc = Document::parse(r#"{"status": "NEW", "total": 99}"#)?;
//! collection.upsert(&key, &doc)?;
//!
//! let query = Query::new()
//!     .with_filter(field("status").eq("NEW"))
//!     .order_by("created_at", SortOrder::Descending)
//!     .limit(10);
//! for doc in collection.search(&query)? {
//!     println!("{}", doc?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - The `Collection` trait and mutation result types
//! - [`constants`] - Reserved document field names
//! - [`document`] - The opaque JSON document type
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters and the fluent filter builder
//! - [`key`] - Opaque document keys
//! - [`query`] - Query building (filter, sort, projection, pagination)
//! - [`stream`] - Lazy document cursors

use parking_lot::RwLock;
use std::sync::Arc;

pub mod collection;
pub mod constants;
pub mod document;
pub mod errors;
pub mod filter;
pub mod key;
pub mod query;
pub mod stream;

pub use collection::{Collection, CreateResult, UpdateResult, UNSUPPORTED_QUERY_OPERATION};
pub use document::Document;
pub use key::Key;
pub use query::{OrderBy, Query, SortOrder};
pub use stream::DocumentStream;

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}
