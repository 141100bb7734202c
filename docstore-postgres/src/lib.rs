//! # docstore-postgres - Postgres/JSONB backend for docstore
//!
//! This crate implements the [docstore::Collection] contract on top of a
//! relational engine storing documents in a JSONB column. Its center is the
//! filter compiler: it recursively lowers a backend-agnostic
//! [docstore::filter::Filter] tree into parameterized SQL, distinguishing
//! physical (typed) columns from JSON-embedded fields, addressing nested
//! JSON paths, and applying NULL-aware semantics to the negation operators.
//!
//! Execution goes through the [client::PostgresClient] seam; connection
//! management, pooling, and transactions live behind it and outside this
//! crate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore::{Collection, Document, Key};
//! use docstore_postgres::PostgresCollection;
//!
//! # fn example(client: std::sync::Arc<dyn docstore_postgres::PostgresClient>)
//! #     -> docstore::errors::DocStoreResult<()> {
//! let collection = PostgresCollection::new(client, "orders")?;
//! collection.upsert(&Key::new("o1"), &Document::parse(r#"{"total": 42}"#)?)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod compiler;
pub mod field;
pub mod params;
pub mod query;
pub mod sql;

mod collection;

pub use client::{PostgresClient, Row, RowStream};
pub use collection::PostgresCollection;
pub use field::{CREATED_AT, DOCUMENT, ID, OUTER_COLUMNS, UPDATED_AT};
pub use params::{Params, SqlValue};
